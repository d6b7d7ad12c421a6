//! Services and components
//!
//! Both types changed addressing across server versions: services
//! gained a top-level route, components later gained one too. Handles
//! constructed through a cluster or service pick the right shape per
//! the connected server; the legacy shape nests under the parent
//! instance path.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::objects::cluster::{Cluster, ClusterRecord};
use crate::objects::stack::ServicePrototype;
use crate::resource::collection::{Collection, Filter, Paging};
use crate::resource::object::{Configurable, Entity, Obj, WithActions};
use crate::resource::route::Seg;
use crate::version::{self, COMPONENT_ROOT_SINCE};

// =========================================================================
// Service
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub cluster_id: Option<u64>,
    pub prototype_id: Option<u64>,
    pub bundle_id: Option<u64>,
    pub state: Option<String>,
    pub status: Option<Value>,
    pub monitoring: Option<String>,
    pub issue: Option<Value>,
    pub url: Option<String>,
}

impl Entity for ServiceRecord {
    const KIND: &'static str = "service";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("service")]);
    const SUB: Option<&'static [&'static str]> = Some(&["service"]);
    const ID_PARAM: &'static str = "service_id";
    const FILTERS: &'static [&'static str] = &["name", "cluster_id", "prototype_id"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Configurable for ServiceRecord {}
impl WithActions for ServiceRecord {}

pub type Service = Obj<ServiceRecord>;

impl Obj<ServiceRecord> {
    /// The cluster this service belongs to.
    pub async fn cluster(&mut self) -> Result<Cluster> {
        let cluster_id = self
            .record()
            .await?
            .cluster_id
            .ok_or(Error::NotFound(ClusterRecord::KIND))?;
        self.client().cluster(cluster_id)
    }

    /// The prototype this service was created from.
    pub async fn prototype(&mut self) -> Result<ServicePrototype> {
        let prototype_id = self
            .record()
            .await?
            .prototype_id
            .ok_or(Error::NotFound("service prototype"))?;
        self.client().service_prototype(prototype_id)
    }

    /// One component of this service, addressed per the server version.
    pub async fn component_find(&self, filter: Filter) -> Result<Component> {
        let modern = version::select(
            self.client().server_version(),
            COMPONENT_ROOT_SINCE,
            true,
            false,
        );
        if modern {
            self.child_find(filter).await
        } else {
            self.sub_find(filter).await
        }
    }

    /// All components of this service, addressed per the server version.
    pub fn component_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ComponentRecord>> {
        let modern = version::select(
            self.client().server_version(),
            COMPONENT_ROOT_SINCE,
            true,
            false,
        );
        if modern {
            self.child_collection(filter, paging)
        } else {
            self.sub_collection(filter, paging)
        }
    }

    /// Bind this service to another cluster's exports.
    pub async fn bind_cluster(&self, export: &Cluster) -> Result<()> {
        let body = json!({ "export_cluster_id": export.id() });
        self.subcall(&["bind"], Method::POST, Some(&body)).await?;
        Ok(())
    }

    /// Bind this service to another service's exports.
    pub async fn bind_service(&self, export: &mut Service) -> Result<()> {
        let cluster_id = export
            .record()
            .await?
            .cluster_id
            .ok_or(Error::NotFound(ClusterRecord::KIND))?;
        let body = json!({
            "export_cluster_id": cluster_id,
            "export_service_id": export.id(),
        });
        self.subcall(&["bind"], Method::POST, Some(&body)).await?;
        Ok(())
    }

    pub async fn bind_list(&self) -> Result<Value> {
        self.subcall(&["bind"], Method::GET, None).await
    }

    /// Import targets offered to this service.
    pub async fn imports(&self) -> Result<Value> {
        self.subcall(&["import"], Method::GET, None).await
    }
}

// =========================================================================
// Component
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub cluster_id: Option<u64>,
    pub service_id: Option<u64>,
    pub prototype_id: Option<u64>,
    pub constraint: Option<Value>,
    pub requires: Option<Value>,
    pub bound_to: Option<Value>,
    pub monitoring: Option<String>,
    pub state: Option<String>,
    pub status: Option<Value>,
}

impl Entity for ComponentRecord {
    const KIND: &'static str = "component";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("component")]);
    const SUB: Option<&'static [&'static str]> = Some(&["component"]);
    const ID_PARAM: &'static str = "component_id";
    const FILTERS: &'static [&'static str] = &["cluster_id", "service_id", "name"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Configurable for ComponentRecord {}
impl WithActions for ComponentRecord {}

pub type Component = Obj<ComponentRecord>;

impl Obj<ComponentRecord> {
    /// The service this component belongs to. Uses the top-level
    /// service route, so the component record must carry `service_id`.
    pub async fn service(&mut self) -> Result<Service> {
        let service_id = self
            .record()
            .await?
            .service_id
            .ok_or(Error::NotFound(ServiceRecord::KIND))?;
        self.client().service(service_id)
    }

    /// The cluster this component's service belongs to.
    pub async fn cluster(&mut self) -> Result<Cluster> {
        let cluster_id = self
            .record()
            .await?
            .cluster_id
            .ok_or(Error::NotFound(ClusterRecord::KIND))?;
        self.client().cluster(cluster_id)
    }
}
