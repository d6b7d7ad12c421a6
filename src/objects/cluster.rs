//! Clusters
//!
//! The cluster is the central object of the graph: hosts join it,
//! services are added to it from the bundle's prototypes, and the
//! host-component map assigns service components to member hosts.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::objects::created_id;
use crate::objects::provider::{Host, HostRecord};
use crate::objects::service::{Service, ServiceRecord};
use crate::objects::stack::{Bundle, ClusterPrototype};
use crate::objects::upgrade::{Upgrade, UpgradeRecord};
use crate::resource::collection::{Collection, Filter, Paging};
use crate::resource::object::{Configurable, Entity, Obj, WithActions};
use crate::resource::route::Seg;
use crate::version::{self, SERVICE_DELETE_SINCE, SERVICE_ROOT_SINCE};

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub prototype_id: Option<u64>,
    pub bundle_id: Option<u64>,
    pub state: Option<String>,
    pub status: Option<Value>,
    pub edition: Option<String>,
    pub license: Option<String>,
    pub issue: Option<Value>,
    pub url: Option<String>,
}

impl Entity for ClusterRecord {
    const KIND: &'static str = "cluster";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("cluster")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "cluster_id";
    const FILTERS: &'static [&'static str] = &["name", "prototype_id"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Configurable for ClusterRecord {}
impl WithActions for ClusterRecord {}

pub type Cluster = Obj<ClusterRecord>;

/// One entry of the host-component map: which component of which
/// service runs on which host.
#[derive(Debug, Clone, Copy)]
pub struct HostComponent {
    pub host_id: u64,
    pub service_id: u64,
    pub component_id: u64,
}

impl Obj<ClusterRecord> {
    /// The prototype this cluster was created from.
    pub async fn prototype(&mut self) -> Result<ClusterPrototype> {
        let prototype_id = self
            .record()
            .await?
            .prototype_id
            .ok_or(Error::NotFound("cluster prototype"))?;
        self.client().cluster_prototype(prototype_id)
    }

    /// The bundle this cluster came from, via its prototype.
    pub async fn bundle(&mut self) -> Result<Bundle> {
        let mut prototype = self.prototype().await?;
        prototype.bundle().await
    }

    // ---------------------------------------------------------------------
    // Hosts
    // ---------------------------------------------------------------------

    /// Add an existing host to this cluster.
    pub async fn host_add(&self, host: &Host) -> Result<Host> {
        let body = json!({ "host_id": host.id() });
        let response = self.subcall(&["host"], Method::POST, Some(&body)).await?;
        let id = created_id(HostRecord::KIND, &response)?;
        self.client().host(id)
    }

    /// Remove a host from this cluster (the host itself survives).
    pub async fn host_delete(&self, host: &Host) -> Result<()> {
        let id = host.id().to_string();
        self.subcall(&["host", &id], Method::DELETE, None).await?;
        Ok(())
    }

    pub async fn host_find(&self, filter: Filter) -> Result<Host> {
        self.child_find(filter).await
    }

    pub fn host_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<HostRecord>> {
        self.child_collection(filter, paging)
    }

    // ---------------------------------------------------------------------
    // Services
    // ---------------------------------------------------------------------

    /// Add a service from the bundle's prototype by name.
    ///
    /// On servers where services are top-level the create call carries
    /// the cluster id and the returned handle uses the top-level route;
    /// older servers address the service as a subobject of this
    /// cluster.
    pub async fn service_add(&mut self, name: &str) -> Result<Service> {
        let bundle = self.bundle().await?;
        let prototype = bundle
            .service_prototype(Filter::new().field("name", name))
            .await?;

        let modern = version::select(
            self.client().server_version(),
            SERVICE_ROOT_SINCE,
            true,
            false,
        );
        let body = if modern {
            json!({ "prototype_id": prototype.id(), "cluster_id": self.id() })
        } else {
            json!({ "prototype_id": prototype.id() })
        };
        let response = self.subcall(&["service"], Method::POST, Some(&body)).await?;
        let id = created_id(ServiceRecord::KIND, &response)?;
        tracing::info!("added service {} to cluster {}", name, self.id());
        if modern {
            self.client().service(id)
        } else {
            self.subobject(id)
        }
    }

    /// One service of this cluster. Top-level route with a `cluster_id`
    /// filter on modern servers, subobject addressing on older ones.
    pub async fn service_find(&self, filter: Filter) -> Result<Service> {
        let modern = version::select(
            self.client().server_version(),
            SERVICE_ROOT_SINCE,
            true,
            false,
        );
        if modern {
            self.child_find(filter).await
        } else {
            self.sub_find(filter).await
        }
    }

    /// All services of this cluster, addressed per the server version.
    pub fn service_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ServiceRecord>> {
        let modern = version::select(
            self.client().server_version(),
            SERVICE_ROOT_SINCE,
            true,
            false,
        );
        if modern {
            self.child_collection(filter, paging)
        } else {
            self.sub_collection(filter, paging)
        }
    }

    /// Remove a service from this cluster.
    pub async fn service_delete(&self, service: &Service) -> Result<()> {
        self.client().require_version(SERVICE_DELETE_SINCE)?;
        let id = service.id().to_string();
        self.subcall(&["service", &id], Method::DELETE, None).await?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Binds, imports, host-component map
    // ---------------------------------------------------------------------

    /// Bind this cluster to another cluster's exports.
    pub async fn bind_cluster(&self, export: &Cluster) -> Result<()> {
        let body = json!({ "export_cluster_id": export.id() });
        self.subcall(&["bind"], Method::POST, Some(&body)).await?;
        Ok(())
    }

    /// Bind this cluster to a service's exports.
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

    /// The current host-component map.
    pub async fn hostcomponent(&self) -> Result<Value> {
        self.subcall(&["hostcomponent"], Method::GET, None).await
    }

    /// Replace the host-component map.
    pub async fn hostcomponent_set(&self, entries: &[HostComponent]) -> Result<Value> {
        let hc: Vec<Value> = entries
            .iter()
            .map(|e| {
                json!({
                    "host_id": e.host_id,
                    "service_id": e.service_id,
                    "component_id": e.component_id,
                })
            })
            .collect();
        let body = json!({ "hc": hc });
        self.subcall(&["hostcomponent"], Method::POST, Some(&body))
            .await
    }

    /// Import targets offered to this cluster.
    pub async fn imports(&self) -> Result<Value> {
        self.subcall(&["import"], Method::GET, None).await
    }

    /// The status endpoint of this cluster.
    pub async fn status_url(&self) -> Result<Value> {
        self.subcall(&["status"], Method::GET, None).await
    }

    // ---------------------------------------------------------------------
    // Upgrades
    // ---------------------------------------------------------------------

    pub fn upgrade(&self, id: u64) -> Result<Upgrade> {
        self.subobject(id)
    }

    pub fn upgrade_list(&self, paging: Option<Paging>) -> Result<Collection<UpgradeRecord>> {
        self.sub_collection(Filter::new(), paging)
    }
}
