//! Filtered, paginated collections
//!
//! A [`Collection`] is a view over one entity type's listing endpoint.
//! Filter keys are checked against the entity's declared set and passed
//! through to the server verbatim; nothing is filtered client-side.
//! With explicit paging, pages are fetched lazily as iteration proceeds
//! past each page boundary; iteration order is the server's order.

use std::marker::PhantomData;

use reqwest::Method;
use serde_json::Value;

use crate::api::client::Client;
use crate::error::{Error, Result};
use crate::resource::object::{Entity, Obj};
use crate::resource::route::Endpoint;

/// Server-side filter arguments, passed through verbatim.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    entries: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one `key=value` filter pair.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.entries.push((key.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_query(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| {
                let rendered = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), rendered)
            })
            .collect()
    }
}

/// Offset/limit paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub offset: u64,
    pub limit: u64,
}

impl Paging {
    pub fn new(offset: u64, limit: u64) -> Self {
        Paging { offset, limit }
    }
}

/// A lazy, filterable view over one entity type's listing endpoint.
pub struct Collection<E: Entity> {
    client: Client,
    endpoint: Endpoint,
    filter: Filter,
    paging: Option<Paging>,
    _entity: PhantomData<E>,
}

struct Page<E: Entity> {
    items: Vec<Obj<E>>,
    has_more: bool,
}

impl<E: Entity> Collection<E> {
    /// Build a collection, rejecting filter keys the entity does not
    /// declare.
    pub(crate) fn new(
        client: Client,
        endpoint: Endpoint,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Self> {
        for (key, _) in &filter.entries {
            if !E::FILTERS.contains(&key.as_str()) {
                return Err(Error::UnsupportedFilter {
                    entity: E::KIND,
                    filter: key.clone(),
                });
            }
        }
        Ok(Collection {
            client,
            endpoint,
            filter,
            paging,
            _entity: PhantomData,
        })
    }

    /// Fetch every matching object, walking all pages.
    pub async fn all(&self) -> Result<Vec<Obj<E>>> {
        let mut items = Vec::new();
        let mut pager = self.pages();
        while let Some(page) = pager.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }

    /// The single matching object. Fails with [`Error::NotFound`] on
    /// zero matches and [`Error::TooManyResults`] on more than one.
    pub async fn one(&self) -> Result<Obj<E>> {
        let mut items = self.all().await?;
        match items.len() {
            0 => Err(Error::NotFound(E::KIND)),
            1 => Ok(items.remove(0)),
            _ => Err(Error::TooManyResults(E::KIND)),
        }
    }

    /// Lazy page-by-page iteration (restartable: each call starts a
    /// fresh pass).
    pub fn pages(&self) -> Pager<'_, E> {
        Pager {
            collection: self,
            offset: self.paging.map(|p| p.offset).unwrap_or(0),
            done: false,
        }
    }

    async fn fetch_page(&self, paging: Option<Paging>) -> Result<Page<E>> {
        let mut query = self.filter.to_query();
        if let Some(p) = paging {
            query.push(("offset".to_string(), p.offset.to_string()));
            query.push(("limit".to_string(), p.limit.to_string()));
        }

        let body = self
            .client
            .request(Method::GET, &self.endpoint.url_path(), &query, None)
            .await?;

        // Two list shapes exist: a bare array (unpaged) and a counted
        // envelope {"count", "next", "previous", "results"}.
        let (raw_items, has_more) = match body {
            Value::Array(items) => (items, false),
            Value::Object(mut map) => {
                let items = match map.remove("results") {
                    Some(Value::Array(items)) => items,
                    _ => {
                        return Err(Error::Protocol(format!(
                            "{} listing has no results array",
                            E::KIND
                        )))
                    }
                };
                let has_more = map.get("next").map(|v| !v.is_null()).unwrap_or(false);
                (items, has_more)
            }
            _ => {
                return Err(Error::Protocol(format!(
                    "{} listing is neither an array nor an envelope",
                    E::KIND
                )))
            }
        };

        let mut items = Vec::with_capacity(raw_items.len());
        for raw in raw_items {
            let record: E = serde_json::from_value(raw)?;
            let id = record
                .id()
                .ok_or_else(|| Error::Protocol(format!("{} record has no id", E::KIND)))?;
            items.push(Obj::primed(
                self.client.clone(),
                self.endpoint.item(id),
                record,
            )?);
        }
        Ok(Page { items, has_more })
    }
}

/// Single-pass page iterator over a [`Collection`].
pub struct Pager<'a, E: Entity> {
    collection: &'a Collection<E>,
    offset: u64,
    done: bool,
}

impl<E: Entity> Pager<'_, E> {
    /// The next page of objects, or `None` when exhausted.
    ///
    /// Without explicit paging the server returns the complete set in
    /// one response; with paging, the window advances by `limit` until
    /// the server reports no further page.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Obj<E>>>> {
        if self.done {
            return Ok(None);
        }
        let window = self.collection.paging.map(|p| Paging {
            offset: self.offset,
            limit: p.limit,
        });
        let page = self.collection.fetch_page(window).await?;
        match window {
            Some(w) => {
                self.offset = w.offset + w.limit;
                self.done = !page.has_more;
            }
            None => self.done = true,
        }
        Ok(Some(page.items))
    }
}
