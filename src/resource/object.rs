//! The generic resource handle
//!
//! [`Obj<E>`] is a lazily-populated handle to one remote object. The
//! identity (entity type, id, resolved path) is fixed at construction;
//! the record cache is filled on first access and always replaced
//! wholesale, never merged, so a field removed server-side disappears
//! from the cache on the next [`Obj::reread`].

use std::fmt;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::client::Client;
use crate::error::{Error, Result};
use crate::resource::collection::{Collection, Filter, Paging};
use crate::resource::route::{Endpoint, PathArgs, Seg};

/// Static description of an entity type plus its record schema.
///
/// Implementations are mechanical: a serde record struct with optional
/// fields (older servers omit newer fields) and a handful of consts
/// describing where the entity lives in the REST tree.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    /// Entity name used in paths-by-convention and error messages.
    const KIND: &'static str;
    /// Top-level route, if the entity is addressable outside a parent.
    const ROOT: Option<&'static [Seg]>;
    /// Subobject suffix under a parent instance path, if nested
    /// addressing exists.
    const SUB: Option<&'static [&'static str]>;
    /// The parameter name children use to bind this entity as ancestor,
    /// e.g. `"cluster_id"`.
    const ID_PARAM: &'static str;
    /// Filter keys the server accepts for this entity's collection.
    const FILTERS: &'static [&'static str];

    /// The record's own id, present on every fetched record.
    fn id(&self) -> Option<u64>;
}

/// Marker for entities carrying the nested configuration document.
pub trait Configurable: Entity {}

/// Marker for entities that expose actions.
pub trait WithActions: Entity {}

/// Entities with a polled `status` field.
pub trait HasStatus: Entity {
    fn status(&self) -> Option<&str>;
}

/// How [`Obj::update`] ships its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Send only the given fields (`PATCH`).
    Partial,
    /// Send the payload as the full record (`PUT`).
    Full,
}

/// A handle to one remote object of type `E`.
pub struct Obj<E: Entity> {
    client: Client,
    endpoint: Endpoint,
    id: u64,
    record: Option<E>,
}

impl<E: Entity> fmt::Debug for Obj<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obj")
            .field("kind", &E::KIND)
            .field("id", &self.id)
            .field("fetched", &self.record.is_some())
            .finish()
    }
}

impl<E: Entity> Obj<E> {
    /// An unfetched handle addressed by the entity's top-level route.
    pub(crate) fn root(client: Client, id: u64) -> Result<Self> {
        let route = E::ROOT.ok_or(Error::UnresolvedPath {
            entity: E::KIND,
            binding: "parent",
        })?;
        let endpoint = Endpoint::instance(E::KIND, route, &PathArgs::new(), id)?;
        Ok(Self::at(client, endpoint, id))
    }

    /// An unfetched handle at an already-resolved endpoint.
    pub(crate) fn at(client: Client, endpoint: Endpoint, id: u64) -> Self {
        Obj {
            client,
            endpoint,
            id,
            record: None,
        }
    }

    /// A handle primed with a record that the server just returned
    /// (list entries arrive as full records).
    pub(crate) fn primed(client: Client, endpoint: Endpoint, record: E) -> Result<Self> {
        let id = record
            .id()
            .ok_or_else(|| Error::Protocol(format!("{} record has no id", E::KIND)))?;
        Ok(Obj {
            client,
            endpoint,
            id,
            record: Some(record),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The cached record, fetching it on first access.
    pub async fn record(&mut self) -> Result<&E> {
        if self.record.is_none() {
            return self.reread().await;
        }
        Ok(self.record.as_ref().unwrap())
    }

    /// Force a re-fetch, replacing the entire cache.
    pub async fn reread(&mut self) -> Result<&E> {
        let value = self.fetch().await?;
        self.record = Some(serde_json::from_value(value)?);
        Ok(self.record.as_ref().unwrap())
    }

    async fn fetch(&self) -> Result<Value> {
        match self
            .client
            .request(Method::GET, &self.endpoint.url_path(), &[], None)
            .await
        {
            Err(Error::Api { status: 404, .. }) => Err(Error::NotFound(E::KIND)),
            other => other,
        }
    }

    /// Send a mutation and drop the local cache; the next read fetches
    /// the server's authoritative state (mutation responses are not
    /// assumed to carry the full record).
    pub async fn update(&mut self, fields: Value, mode: UpdateMode) -> Result<()> {
        let method = match mode {
            UpdateMode::Partial => Method::PATCH,
            UpdateMode::Full => Method::PUT,
        };
        self.client
            .request(method, &self.endpoint.url_path(), &[], Some(&fields))
            .await?;
        self.record = None;
        Ok(())
    }

    /// Call a nested endpoint of this instance, e.g.
    /// `cluster/3/config/current`.
    pub(crate) async fn subcall(
        &self,
        sub: &[&str],
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value> {
        let path = self.endpoint.join(sub).url_path();
        self.client.request(method, &path, &[], body).await
    }

    /// A handle to a subobject nested under this instance's path.
    pub(crate) fn subobject<C: Entity>(&self, id: u64) -> Result<Obj<C>> {
        let sub = C::SUB.ok_or(Error::UnresolvedPath {
            entity: C::KIND,
            binding: "subpath",
        })?;
        let endpoint = Endpoint::subobject(&self.endpoint, sub, id);
        Ok(Obj::at(self.client.clone(), endpoint, id))
    }

    /// A collection of subobjects nested under this instance's path.
    pub(crate) fn sub_collection<C: Entity>(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<C>> {
        let sub = C::SUB.ok_or(Error::UnresolvedPath {
            entity: C::KIND,
            binding: "subpath",
        })?;
        let endpoint = Endpoint::subobject_collection(&self.endpoint, sub);
        Collection::new(self.client.clone(), endpoint, filter, paging)
    }

    /// The single subobject matching `filter`.
    pub(crate) async fn sub_find<C: Entity>(&self, filter: Filter) -> Result<Obj<C>> {
        self.sub_collection(filter, None)?.one().await
    }

    /// A top-level collection of `C` filtered down to children of this
    /// instance (this instance's id is passed as a server-side filter).
    pub(crate) fn child_collection<C: Entity>(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<C>> {
        let route = C::ROOT.ok_or(Error::UnresolvedPath {
            entity: C::KIND,
            binding: E::ID_PARAM,
        })?;
        let endpoint = Endpoint::collection(C::KIND, route, &PathArgs::new())?;
        let filter = filter.field(E::ID_PARAM, self.id);
        Collection::new(self.client.clone(), endpoint, filter, paging)
    }

    /// The single child matching `filter`.
    pub(crate) async fn child_find<C: Entity>(&self, filter: Filter) -> Result<Obj<C>> {
        self.child_collection(filter, None)?.one().await
    }
}
