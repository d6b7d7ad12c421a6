//! Upgrades
//!
//! Upgrades exist only as subobjects of a cluster or provider; running
//! one moves the owner to a newer bundle.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::resource::object::{Entity, Obj};
use crate::resource::route::Seg;

#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub bundle_id: Option<u64>,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub min_strict: Option<bool>,
    pub max_strict: Option<bool>,
    pub upgradable: Option<bool>,
    pub license_url: Option<String>,
    pub state_available: Option<Value>,
    pub state_on_success: Option<String>,
    pub from_edition: Option<Value>,
    pub url: Option<String>,
}

impl Entity for UpgradeRecord {
    const KIND: &'static str = "upgrade";
    const ROOT: Option<&'static [Seg]> = None;
    const SUB: Option<&'static [&'static str]> = Some(&["upgrade"]);
    const ID_PARAM: &'static str = "upgrade_id";
    const FILTERS: &'static [&'static str] = &[];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

pub type Upgrade = Obj<UpgradeRecord>;

impl Obj<UpgradeRecord> {
    /// Execute this upgrade on its owner.
    pub async fn run(&self) -> Result<Value> {
        self.subcall(&["do"], Method::POST, Some(&Value::Object(Map::new())))
            .await
    }
}
