//! Providers and hosts
//!
//! A provider owns hosts; a host may additionally be attached to a
//! cluster. Hosts are created through their provider.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::objects::cluster::Cluster;
use crate::objects::created_id;
use crate::objects::stack::{Bundle, BundleRecord, HostPrototype, ProviderPrototype};
use crate::objects::upgrade::{Upgrade, UpgradeRecord};
use crate::resource::collection::{Collection, Filter, Paging};
use crate::resource::object::{Configurable, Entity, Obj, WithActions};
use crate::resource::route::Seg;

// =========================================================================
// Provider
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub prototype_id: Option<u64>,
    pub bundle_id: Option<u64>,
    pub state: Option<String>,
    pub edition: Option<String>,
    pub license: Option<String>,
    pub issue: Option<Value>,
    pub url: Option<String>,
}

impl Entity for ProviderRecord {
    const KIND: &'static str = "provider";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("provider")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "provider_id";
    const FILTERS: &'static [&'static str] = &["name", "prototype_id"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Configurable for ProviderRecord {}
impl WithActions for ProviderRecord {}

pub type Provider = Obj<ProviderRecord>;

impl Obj<ProviderRecord> {
    /// The prototype this provider was created from.
    pub async fn prototype(&mut self) -> Result<ProviderPrototype> {
        let prototype_id = self
            .record()
            .await?
            .prototype_id
            .ok_or(Error::NotFound("provider prototype"))?;
        self.client().provider_prototype(prototype_id)
    }

    /// The bundle this provider came from.
    pub async fn bundle(&mut self) -> Result<Bundle> {
        let bundle_id = self
            .record()
            .await?
            .bundle_id
            .ok_or(Error::NotFound(BundleRecord::KIND))?;
        self.client().bundle(bundle_id)
    }

    /// Register a new host under this provider.
    pub async fn host_create(&self, fqdn: &str) -> Result<Host> {
        let body = json!({ "fqdn": fqdn });
        let response = self.subcall(&["host"], Method::POST, Some(&body)).await?;
        let id = created_id(HostRecord::KIND, &response)?;
        tracing::info!("created host {} ({})", fqdn, id);
        self.client().host(id)
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

    pub fn upgrade(&self, id: u64) -> Result<Upgrade> {
        self.subobject(id)
    }

    pub fn upgrade_list(&self, paging: Option<Paging>) -> Result<Collection<UpgradeRecord>> {
        self.sub_collection(Filter::new(), paging)
    }
}

// =========================================================================
// Host
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HostRecord {
    pub id: Option<u64>,
    pub fqdn: Option<String>,
    pub description: Option<String>,
    pub prototype_id: Option<u64>,
    pub provider_id: Option<u64>,
    pub cluster_id: Option<u64>,
    pub bundle_id: Option<u64>,
    pub state: Option<String>,
    pub status: Option<Value>,
    pub issue: Option<Value>,
    pub url: Option<String>,
}

impl Entity for HostRecord {
    const KIND: &'static str = "host";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("host")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "host_id";
    const FILTERS: &'static [&'static str] = &["fqdn", "prototype_id", "provider_id", "cluster_id"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Configurable for HostRecord {}
impl WithActions for HostRecord {}

pub type Host = Obj<HostRecord>;

impl Obj<HostRecord> {
    /// The provider owning this host.
    pub async fn provider(&mut self) -> Result<Provider> {
        let provider_id = self
            .record()
            .await?
            .provider_id
            .ok_or(Error::NotFound(ProviderRecord::KIND))?;
        self.client().provider(provider_id)
    }

    /// The cluster this host belongs to, or `None` while unattached.
    pub async fn cluster(&mut self) -> Result<Option<Cluster>> {
        match self.record().await?.cluster_id {
            Some(cluster_id) => Ok(Some(self.client().cluster(cluster_id)?)),
            None => Ok(None),
        }
    }

    /// The bundle the host's prototype came from.
    pub async fn bundle(&mut self) -> Result<Bundle> {
        let bundle_id = self
            .record()
            .await?
            .bundle_id
            .ok_or(Error::NotFound(BundleRecord::KIND))?;
        self.client().bundle(bundle_id)
    }

    /// The prototype this host was created from.
    pub async fn prototype(&mut self) -> Result<HostPrototype> {
        let prototype_id = self
            .record()
            .await?
            .prototype_id
            .ok_or(Error::NotFound("host prototype"))?;
        self.client().host_prototype(prototype_id)
    }
}
