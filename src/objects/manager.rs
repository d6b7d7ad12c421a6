//! The cluster-manager singleton
//!
//! The manager itself is an object with a configuration document, used
//! e.g. to record the externally reachable URL.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::objects::stack::Prototype;
use crate::resource::object::{Configurable, Entity, Obj, WithActions};
use crate::resource::route::Seg;

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub prototype_id: Option<u64>,
    pub bundle_id: Option<u64>,
    pub prototype_version: Option<String>,
    pub url: Option<String>,
}

impl Entity for ManagerRecord {
    const KIND: &'static str = "manager";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("manager")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "manager_id";
    const FILTERS: &'static [&'static str] = &[];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Configurable for ManagerRecord {}
impl WithActions for ManagerRecord {}

pub type Manager = Obj<ManagerRecord>;

impl Obj<ManagerRecord> {
    /// The manager's own prototype.
    pub async fn prototype(&mut self) -> Result<Prototype> {
        let prototype_id = self
            .record()
            .await?
            .prototype_id
            .ok_or(Error::NotFound("prototype"))?;
        self.client().prototype(prototype_id)
    }
}
