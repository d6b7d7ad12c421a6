//! Bundles and prototypes
//!
//! A bundle is an uploaded package of prototypes; a prototype is the
//! template an object (cluster, service, provider, host) is created
//! from. Both live under the `stack/` prefix.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::objects::created_id;
use crate::objects::cluster::{Cluster, ClusterRecord};
use crate::objects::provider::{Host, HostRecord, Provider, ProviderRecord};
use crate::objects::service::ServiceRecord;
use crate::resource::collection::{Collection, Filter, Paging};
use crate::resource::object::{Entity, Obj};
use crate::resource::route::Seg;
use crate::version::SERVICE_ROOT_SINCE;

// =========================================================================
// Bundle
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BundleRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub edition: Option<String>,
}

impl Entity for BundleRecord {
    const KIND: &'static str = "bundle";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("stack"), Seg::Lit("bundle")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "bundle_id";
    const FILTERS: &'static [&'static str] = &["name", "version"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

pub type Bundle = Obj<BundleRecord>;

impl Obj<BundleRecord> {
    /// The bundle's cluster prototype. Fails with
    /// [`Error::IncorrectPrototype`] when the bundle carries none.
    pub async fn cluster_prototype(&self) -> Result<ClusterPrototype> {
        self.child_find(Filter::new()).await.map_err(incorrect_kind)
    }

    /// The bundle's provider prototype.
    pub async fn provider_prototype(&self) -> Result<ProviderPrototype> {
        self.child_find(Filter::new()).await.map_err(incorrect_kind)
    }

    /// A service prototype of this bundle, selected by `filter`
    /// (typically `name`).
    pub async fn service_prototype(&self, filter: Filter) -> Result<ServicePrototype> {
        self.child_find(filter).await
    }

    pub async fn host_prototype(&self, filter: Filter) -> Result<HostPrototype> {
        self.child_find(filter).await
    }

    /// Create a cluster from this bundle's cluster prototype.
    pub async fn cluster_create(&self, name: &str, description: Option<&str>) -> Result<Cluster> {
        let mut prototype = self.cluster_prototype().await?;
        prototype.cluster_create(name, description).await
    }

    /// Create a provider from this bundle's provider prototype.
    pub async fn provider_create(&self, name: &str, description: Option<&str>) -> Result<Provider> {
        let mut prototype = self.provider_prototype().await?;
        prototype.provider_create(name, description).await
    }

    /// Clusters created from this bundle.
    pub async fn cluster_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ClusterRecord>> {
        let prototype = self.cluster_prototype().await?;
        prototype.cluster_list(filter, paging)
    }

    /// Providers created from this bundle.
    pub async fn provider_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ProviderRecord>> {
        let prototype = self.provider_prototype().await?;
        prototype.provider_list(filter, paging)
    }

    /// The bundle's license text.
    pub async fn license(&self) -> Result<Value> {
        self.subcall(&["license"], Method::GET, None).await
    }

    /// Accept the bundle's license.
    pub async fn license_accept(&self) -> Result<()> {
        self.subcall(&["license", "accept"], Method::PUT, None)
            .await?;
        Ok(())
    }
}

/// An absent prototype of the requested kind is reported as a distinct
/// condition, not a generic lookup miss.
fn incorrect_kind(err: Error) -> Error {
    if err.is_not_found() {
        Error::IncorrectPrototype
    } else {
        err
    }
}

// =========================================================================
// Prototypes
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PrototypeRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub bundle_id: Option<u64>,
    pub config: Option<Value>,
    pub url: Option<String>,
}

impl Entity for PrototypeRecord {
    const KIND: &'static str = "prototype";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("stack"), Seg::Lit("prototype")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "prototype_id";
    const FILTERS: &'static [&'static str] = &["name", "bundle_id"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

pub type Prototype = Obj<PrototypeRecord>;

impl Obj<PrototypeRecord> {
    /// The bundle this prototype came from.
    pub async fn bundle(&mut self) -> Result<Bundle> {
        let bundle_id = self
            .record()
            .await?
            .bundle_id
            .ok_or(Error::NotFound(BundleRecord::KIND))?;
        self.client().bundle(bundle_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterPrototypeRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub bundle_id: Option<u64>,
    pub config: Option<Value>,
    pub url: Option<String>,
}

impl Entity for ClusterPrototypeRecord {
    const KIND: &'static str = "cluster prototype";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("stack"), Seg::Lit("cluster")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "prototype_id";
    const FILTERS: &'static [&'static str] = &["name", "bundle_id"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

pub type ClusterPrototype = Obj<ClusterPrototypeRecord>;

impl Obj<ClusterPrototypeRecord> {
    /// The bundle this prototype came from.
    pub async fn bundle(&mut self) -> Result<Bundle> {
        let bundle_id = self
            .record()
            .await?
            .bundle_id
            .ok_or(Error::NotFound(BundleRecord::KIND))?;
        self.client().bundle(bundle_id)
    }

    /// Create a cluster from this prototype.
    pub async fn cluster_create(&mut self, name: &str, description: Option<&str>) -> Result<Cluster> {
        let record = self.record().await?;
        if record.kind.as_deref() != Some("cluster") {
            return Err(Error::IncorrectPrototype);
        }
        let mut body = json!({ "prototype_id": self.id(), "name": name });
        if let Some(description) = description {
            body["description"] = json!(description);
        }
        let response = self
            .client()
            .request(Method::POST, "cluster/", &[], Some(&body))
            .await?;
        let id = created_id(ClusterRecord::KIND, &response)?;
        tracing::info!("created cluster {} ({})", name, id);
        self.client().cluster(id)
    }

    pub async fn cluster_find(&self, filter: Filter) -> Result<Cluster> {
        self.child_find(filter).await
    }

    pub fn cluster_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ClusterRecord>> {
        self.child_collection(filter, paging)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicePrototypeRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub bundle_id: Option<u64>,
    pub bundle_edition: Option<String>,
    pub shared: Option<bool>,
    pub required: Option<bool>,
    pub monitoring: Option<String>,
    pub config: Option<Value>,
    pub url: Option<String>,
}

impl Entity for ServicePrototypeRecord {
    const KIND: &'static str = "service prototype";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("stack"), Seg::Lit("service")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "prototype_id";
    const FILTERS: &'static [&'static str] = &["name", "bundle_id"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

pub type ServicePrototype = Obj<ServicePrototypeRecord>;

impl Obj<ServicePrototypeRecord> {
    /// Services created from this prototype. Needs the top-level
    /// service route, so the server version is checked first.
    pub fn service_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ServiceRecord>> {
        self.client().require_version(SERVICE_ROOT_SINCE)?;
        self.child_collection(filter, paging)
    }

    pub async fn service_find(&self, filter: Filter) -> Result<crate::objects::Service> {
        self.client().require_version(SERVICE_ROOT_SINCE)?;
        self.child_find(filter).await
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPrototypeRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub bundle_id: Option<u64>,
    pub bundle_edition: Option<String>,
    pub required: Option<bool>,
    pub license: Option<String>,
    pub config: Option<Value>,
    pub url: Option<String>,
}

impl Entity for ProviderPrototypeRecord {
    const KIND: &'static str = "provider prototype";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("stack"), Seg::Lit("provider")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "prototype_id";
    const FILTERS: &'static [&'static str] = &["name", "bundle_id"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

pub type ProviderPrototype = Obj<ProviderPrototypeRecord>;

impl Obj<ProviderPrototypeRecord> {
    /// Create a provider from this prototype.
    pub async fn provider_create(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Provider> {
        let record = self.record().await?;
        if record.kind.as_deref() != Some("provider") {
            return Err(Error::IncorrectPrototype);
        }
        let mut body = json!({ "prototype_id": self.id(), "name": name });
        if let Some(description) = description {
            body["description"] = json!(description);
        }
        let response = self
            .client()
            .request(Method::POST, "provider/", &[], Some(&body))
            .await?;
        let id = created_id(ProviderRecord::KIND, &response)?;
        tracing::info!("created provider {} ({})", name, id);
        self.client().provider(id)
    }

    pub async fn provider_find(&self, filter: Filter) -> Result<Provider> {
        self.child_find(filter).await
    }

    pub fn provider_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ProviderRecord>> {
        self.child_collection(filter, paging)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostPrototypeRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub bundle_id: Option<u64>,
    pub bundle_edition: Option<String>,
    pub required: Option<bool>,
    pub monitoring: Option<String>,
    pub config: Option<Value>,
    pub url: Option<String>,
}

impl Entity for HostPrototypeRecord {
    const KIND: &'static str = "host prototype";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("stack"), Seg::Lit("host")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "prototype_id";
    const FILTERS: &'static [&'static str] = &["name", "bundle_id"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

pub type HostPrototype = Obj<HostPrototypeRecord>;

impl Obj<HostPrototypeRecord> {
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
}
