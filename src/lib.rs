//! Async client library for a cluster-management REST service.
//!
//! The service exposes a hierarchical object graph (bundles and
//! prototypes, clusters, services, components, providers, hosts) plus
//! actions whose execution is tracked through tasks and jobs. This
//! crate wraps that API behind typed handles: a [`Client`] is connected
//! once with credentials, entity handles are cheap and lazily fetch
//! their backing record, and long-running operations are awaited with
//! status polling.
//!
//! ```no_run
//! use stackware_client::{Client, Filter, RunParams};
//!
//! # async fn demo() -> stackware_client::Result<()> {
//! let client = Client::connect("http://localhost:8000", "admin", "admin").await?;
//! let cluster = client.cluster_find(Filter::new().field("name", "prod")).await?;
//! let mut task = cluster.action_run("start", RunParams::new()).await?;
//! task.try_wait(None).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod objects;
pub mod resource;
pub mod version;

pub use api::Client;
pub use error::{Error, Result};
pub use objects::{
    Action, ActionRecord, Bundle, BundleRecord, Cluster, ClusterPrototype, ClusterPrototypeRecord,
    ClusterRecord, Component, ComponentRecord, Host, HostComponent, HostPrototype,
    HostPrototypeRecord, HostRecord, Job, JobRecord, Log, LogFileRef, LogRecord, Manager,
    ManagerRecord, Prototype, PrototypeRecord, Provider, ProviderPrototype,
    ProviderPrototypeRecord, ProviderRecord, RunParams, Service, ServicePrototype,
    ServicePrototypeRecord, ServiceRecord, Task, TaskRecord, Upgrade, UpgradeRecord,
};
pub use resource::{Collection, Filter, Obj, Pager, Paging, UpdateMode};
pub use version::{Version, MIN_SERVER_VERSION};
