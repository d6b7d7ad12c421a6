//! Concrete entity types of the cluster-manager object graph
//!
//! Each entity is a mechanical instantiation of the resource core: a
//! serde record struct (optional fields, since older servers omit newer
//! ones), route/filter declarations, and navigation methods wiring the
//! graph together.
//!
//! # Module Structure
//!
//! - [`stack`] - bundles and prototypes (`stack/...`)
//! - [`cluster`] - clusters and their membership operations
//! - [`provider`] - providers and hosts
//! - [`service`] - services and components
//! - [`action`] - actions and the run call
//! - [`task`] - tasks, jobs and job logs
//! - [`upgrade`] - upgrades nested under clusters and providers
//! - [`manager`] - the cluster-manager singleton

pub mod action;
pub mod cluster;
pub mod manager;
pub mod provider;
pub mod service;
pub mod stack;
pub mod task;
pub mod upgrade;

pub use action::{Action, ActionRecord, RunParams};
pub use cluster::{Cluster, ClusterRecord, HostComponent};
pub use manager::{Manager, ManagerRecord};
pub use provider::{Host, HostRecord, Provider, ProviderRecord};
pub use service::{Component, ComponentRecord, Service, ServiceRecord};
pub use stack::{
    Bundle, BundleRecord, ClusterPrototype, ClusterPrototypeRecord, HostPrototype,
    HostPrototypeRecord, Prototype, PrototypeRecord, ProviderPrototype, ProviderPrototypeRecord,
    ServicePrototype, ServicePrototypeRecord,
};
pub use task::{Job, JobRecord, Log, LogFileRef, LogRecord, Task, TaskRecord};
pub use upgrade::{Upgrade, UpgradeRecord};

use crate::error::{Error, Result};
use serde_json::Value;

/// Pull the new object's id out of a create response.
pub(crate) fn created_id(kind: &'static str, response: &Value) -> Result<u64> {
    response
        .get("id")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| Error::Protocol(format!("{kind} create response has no id")))
}
