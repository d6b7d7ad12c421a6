//! The authenticated API client
//!
//! [`Client`] owns the HTTP transport, the auth token and the server's
//! advertised version, and hands out root object handles. It is a cheap
//! `Arc` clone; every resource handle carries one.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use url::Url;

use crate::api::http::HttpClient;
use crate::error::{Error, Result};
use crate::objects::{
    Bundle, BundleRecord, Cluster, ClusterPrototype, ClusterPrototypeRecord, ClusterRecord,
    Component, ComponentRecord, Host, HostPrototype, HostPrototypeRecord, HostRecord, Job,
    JobRecord, Manager, Prototype, PrototypeRecord, Provider, ProviderPrototype,
    ProviderPrototypeRecord, ProviderRecord, Service, ServicePrototype, ServicePrototypeRecord,
    ServiceRecord, Task, TaskRecord,
};
use crate::resource::collection::{Collection, Filter, Paging};
use crate::resource::object::{Entity, Obj};
use crate::resource::route::{Endpoint, PathArgs};
use crate::version::{
    self, Version, COMPONENT_ROOT_SINCE, MIN_SERVER_VERSION, SERVICE_ROOT_SINCE,
};

struct Inner {
    http: HttpClient,
    base: Url,
    token: String,
    version: Version,
}

/// Handle to one cluster-manager server.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

// The token never appears in debug output.
impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base", &self.inner.base.as_str())
            .field("version", &self.inner.version)
            .finish()
    }
}

impl Client {
    /// Log in and probe the server version.
    ///
    /// Fails with [`Error::Auth`] on bad credentials and with
    /// [`Error::VersionMismatch`] when the server predates
    /// [`MIN_SERVER_VERSION`].
    pub async fn connect(url: &str, user: &str, password: &str) -> Result<Client> {
        let mut base = url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?.join("api/v1/")?;
        let http = HttpClient::new()?;

        let credentials = json!({ "username": user, "password": password });
        let login = http
            .request(
                Method::POST,
                base.join("token/")?,
                None,
                &[],
                Some(&credentials),
            )
            .await
            .map_err(|e| match e {
                Error::Api { status: 400 | 401 | 403, desc, .. } => Error::Auth(desc),
                other => other,
            })?;
        let token = login
            .get("token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Auth("server issued no token".to_string()))?
            .to_string();

        let info = http
            .request(Method::GET, base.join("info/")?, Some(&token), &[], None)
            .await?;
        let version = info
            .get("version")
            .and_then(|v| v.as_str())
            .map(Version::new)
            .ok_or_else(|| Error::Protocol("server info has no version".to_string()))?;

        let client = Client {
            inner: Arc::new(Inner {
                http,
                base,
                token,
                version,
            }),
        };
        client.require_version(MIN_SERVER_VERSION)?;
        Ok(client)
    }

    /// The version string the server advertised at connect time.
    pub fn server_version(&self) -> &Version {
        &self.inner.version
    }

    /// Fail with [`Error::VersionMismatch`] when the server is older
    /// than `required`. Checked locally; no network call is made.
    pub(crate) fn require_version(&self, required: &str) -> Result<()> {
        if version::compare(self.inner.version.as_str(), required) == std::cmp::Ordering::Less {
            return Err(Error::VersionMismatch {
                required: required.to_string(),
                server: self.inner.version.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// One request against a path relative to the API base.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.inner.base.join(path)?;
        self.inner
            .http
            .request(method, url, Some(&self.inner.token), query, body)
            .await
    }

    /// Fetch an absolute URL the server handed back (job log files carry
    /// their own URLs).
    pub(crate) async fn get_url(&self, url: &str) -> Result<Value> {
        let url = Url::parse(url)?;
        self.inner
            .http
            .request(Method::GET, url, Some(&self.inner.token), &[], None)
            .await
    }

    fn obj<E: Entity>(&self, id: u64) -> Result<Obj<E>> {
        Obj::root(self.clone(), id)
    }

    fn list<E: Entity>(&self, filter: Filter, paging: Option<Paging>) -> Result<Collection<E>> {
        let route = E::ROOT.ok_or(Error::UnresolvedPath {
            entity: E::KIND,
            binding: "parent",
        })?;
        let endpoint = Endpoint::collection(E::KIND, route, &PathArgs::new())?;
        Collection::new(self.clone(), endpoint, filter, paging)
    }

    async fn find<E: Entity>(&self, filter: Filter) -> Result<Obj<E>> {
        self.list(filter, None)?.one().await
    }

    // =========================================================================
    // Root object factories
    // =========================================================================

    /// The cluster-manager singleton.
    pub fn manager(&self) -> Result<Manager> {
        self.obj(1)
    }

    pub fn bundle(&self, id: u64) -> Result<Bundle> {
        self.obj(id)
    }

    pub async fn bundle_find(&self, filter: Filter) -> Result<Bundle> {
        self.find(filter).await
    }

    pub fn bundle_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<BundleRecord>> {
        self.list(filter, paging)
    }

    /// Remove a bundle from the server.
    pub async fn bundle_delete(&self, id: u64) -> Result<()> {
        let route = BundleRecord::ROOT.ok_or(Error::UnresolvedPath {
            entity: BundleRecord::KIND,
            binding: "parent",
        })?;
        let endpoint = Endpoint::instance(BundleRecord::KIND, route, &PathArgs::new(), id)?;
        self.request(Method::DELETE, &endpoint.url_path(), &[], None)
            .await?;
        Ok(())
    }

    pub fn prototype(&self, id: u64) -> Result<Prototype> {
        self.obj(id)
    }

    pub fn prototype_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<PrototypeRecord>> {
        self.list(filter, paging)
    }

    pub fn cluster_prototype(&self, id: u64) -> Result<ClusterPrototype> {
        self.obj(id)
    }

    pub async fn cluster_prototype_find(&self, filter: Filter) -> Result<ClusterPrototype> {
        self.find(filter).await
    }

    pub fn cluster_prototype_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ClusterPrototypeRecord>> {
        self.list(filter, paging)
    }

    pub fn service_prototype(&self, id: u64) -> Result<ServicePrototype> {
        self.obj(id)
    }

    pub async fn service_prototype_find(&self, filter: Filter) -> Result<ServicePrototype> {
        self.find(filter).await
    }

    pub fn service_prototype_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ServicePrototypeRecord>> {
        self.list(filter, paging)
    }

    pub fn provider_prototype(&self, id: u64) -> Result<ProviderPrototype> {
        self.obj(id)
    }

    pub async fn provider_prototype_find(&self, filter: Filter) -> Result<ProviderPrototype> {
        self.find(filter).await
    }

    pub fn provider_prototype_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ProviderPrototypeRecord>> {
        self.list(filter, paging)
    }

    pub fn host_prototype(&self, id: u64) -> Result<HostPrototype> {
        self.obj(id)
    }

    pub fn host_prototype_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<HostPrototypeRecord>> {
        self.list(filter, paging)
    }

    pub fn cluster(&self, id: u64) -> Result<Cluster> {
        self.obj(id)
    }

    pub async fn cluster_find(&self, filter: Filter) -> Result<Cluster> {
        self.find(filter).await
    }

    pub fn cluster_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ClusterRecord>> {
        self.list(filter, paging)
    }

    pub fn provider(&self, id: u64) -> Result<Provider> {
        self.obj(id)
    }

    pub async fn provider_find(&self, filter: Filter) -> Result<Provider> {
        self.find(filter).await
    }

    pub fn provider_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ProviderRecord>> {
        self.list(filter, paging)
    }

    pub fn host(&self, id: u64) -> Result<Host> {
        self.obj(id)
    }

    pub async fn host_find(&self, filter: Filter) -> Result<Host> {
        self.find(filter).await
    }

    pub fn host_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<HostRecord>> {
        self.list(filter, paging)
    }

    /// Address a service by id through the top-level route. Requires a
    /// server at or past the version where services became top-level;
    /// older services are reached through their cluster.
    pub fn service(&self, id: u64) -> Result<Service> {
        self.require_version(SERVICE_ROOT_SINCE)?;
        self.obj(id)
    }

    pub fn service_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ServiceRecord>> {
        self.require_version(SERVICE_ROOT_SINCE)?;
        self.list(filter, paging)
    }

    /// Address a component by id through the top-level route; same
    /// version constraint pattern as [`Client::service`].
    pub fn component(&self, id: u64) -> Result<Component> {
        self.require_version(COMPONENT_ROOT_SINCE)?;
        self.obj(id)
    }

    pub fn component_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ComponentRecord>> {
        self.require_version(COMPONENT_ROOT_SINCE)?;
        self.list(filter, paging)
    }

    pub fn task(&self, id: u64) -> Result<Task> {
        self.obj(id)
    }

    pub fn task_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<TaskRecord>> {
        self.list(filter, paging)
    }

    pub fn job(&self, id: u64) -> Result<Job> {
        self.obj(id)
    }

    pub fn job_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<JobRecord>> {
        self.list(filter, paging)
    }
}
