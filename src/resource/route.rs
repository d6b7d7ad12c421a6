//! Endpoint path resolution
//!
//! Every entity type declares a route: a sequence of static literals and
//! named ancestor parameters (e.g. `job/{job_id}/log`). Resolution walks
//! the route, substitutes bound ancestor ids and optionally appends the
//! entity's own id to address a single instance. Subobjects are nested
//! under an already-resolved parent instance path instead.
//!
//! Resolution is a pure function of its inputs; it performs no I/O.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// One declared route segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seg {
    /// A fixed path literal, e.g. `"cluster"`.
    Lit(&'static str),
    /// A named ancestor parameter filled from [`PathArgs`], e.g. `"job_id"`.
    Param(&'static str),
}

/// Ancestor bindings: parent ids keyed by their parameter name.
#[derive(Debug, Clone, Default)]
pub struct PathArgs(BTreeMap<&'static str, u64>);

impl PathArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a parent id, e.g. `PathArgs::new().bind("job_id", 7)`.
    pub fn bind(mut self, key: &'static str, id: u64) -> Self {
        self.0.insert(key, id);
        self
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }
}

/// A fully resolved REST path, ready to be joined onto the API base.
#[derive(Debug, Clone)]
pub struct Endpoint {
    segments: Vec<String>,
}

impl Endpoint {
    /// Resolve a collection path: the route with ancestor ids inserted
    /// at their declared positions, no trailing instance id.
    pub fn collection(entity: &'static str, route: &[Seg], args: &PathArgs) -> Result<Self> {
        let mut segments = Vec::with_capacity(route.len());
        for seg in route {
            match seg {
                Seg::Lit(lit) => segments.push((*lit).to_string()),
                Seg::Param(name) => match args.get(name) {
                    Some(id) => segments.push(id.to_string()),
                    None => {
                        return Err(Error::UnresolvedPath {
                            entity,
                            binding: name,
                        })
                    }
                },
            }
        }
        Ok(Endpoint { segments })
    }

    /// Resolve an instance path: the collection path plus the own id.
    pub fn instance(entity: &'static str, route: &[Seg], args: &PathArgs, id: u64) -> Result<Self> {
        let mut ep = Self::collection(entity, route, args)?;
        ep.segments.push(id.to_string());
        Ok(ep)
    }

    /// A subobject collection nested under a concrete parent instance,
    /// e.g. `cluster/3/action`.
    pub fn subobject_collection(parent: &Endpoint, sub: &[&str]) -> Self {
        let mut segments = parent.segments.clone();
        segments.extend(sub.iter().map(|s| (*s).to_string()));
        Endpoint { segments }
    }

    /// A single subobject nested under a concrete parent instance,
    /// e.g. `cluster/3/action/12`.
    pub fn subobject(parent: &Endpoint, sub: &[&str], id: u64) -> Self {
        let mut ep = Self::subobject_collection(parent, sub);
        ep.segments.push(id.to_string());
        ep
    }

    /// Address one item of this collection path.
    pub fn item(&self, id: u64) -> Self {
        self.join(&[&id.to_string()])
    }

    /// Append extra segments, used for nested calls such as
    /// `cluster/3/config/current`.
    pub fn join(&self, extra: &[&str]) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(extra.iter().map(|s| (*s).to_string()));
        Endpoint { segments }
    }

    /// The relative URL path with a trailing slash, e.g. `cluster/3/`.
    pub fn url_path(&self) -> String {
        let mut path = self.segments.join("/");
        path.push('/');
        path
    }
}
