//! Actions
//!
//! An action is a runnable operation declared by a prototype, addressed
//! as a subobject of the object it applies to. Running one creates a
//! task. The run payload carries a config document derived from the
//! action's declared config schema unless the caller supplies one.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::objects::created_id;
use crate::objects::task::{Task, TaskRecord};
use crate::resource::collection::{Collection, Filter, Paging};
use crate::resource::object::{Entity, Obj, WithActions};
use crate::resource::route::Seg;
use crate::version::{self, ACTION_VERBOSE_SINCE};

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub prototype_id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub script: Option<String>,
    pub script_type: Option<String>,
    pub state_available: Option<Value>,
    pub state_on_success: Option<String>,
    pub state_on_fail: Option<String>,
    pub hostcomponentmap: Option<Value>,
    pub config: Option<Value>,
    pub ui_options: Option<Value>,
    pub allow_to_terminate: Option<bool>,
    pub partial_execution: Option<bool>,
    pub host_action: Option<bool>,
    pub url: Option<String>,
}

impl Entity for ActionRecord {
    const KIND: &'static str = "action";
    const ROOT: Option<&'static [Seg]> = None;
    const SUB: Option<&'static [&'static str]> = Some(&["action"]);
    const ID_PARAM: &'static str = "action_id";
    const FILTERS: &'static [&'static str] = &["name"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

pub type Action = Obj<ActionRecord>;

/// Arguments for [`Action::run`]. `config` and `config_diff` are
/// mutually exclusive: the first replaces the derived defaults, the
/// second patches them.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    config: Option<Value>,
    config_diff: Option<Value>,
    hostcomponent: Option<Value>,
    verbose: Option<bool>,
}

impl RunParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_diff(mut self, diff: Value) -> Self {
        self.config_diff = Some(diff);
        self
    }

    pub fn hostcomponent(mut self, hc: Value) -> Self {
        self.hostcomponent = Some(hc);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }
}

/// Flatten an action's declared config schema (a list of typed items
/// with `name`/`subname`/`value`) into the value document the run call
/// expects: groups become nested maps, everything else a default value.
fn config_defaults(schema: Option<&Value>) -> Value {
    let mut config = Map::new();
    let items = schema
        .and_then(|s| s.get("config"))
        .and_then(|c| c.as_array())
        .cloned()
        .unwrap_or_default();
    for item in &items {
        let name = match item.get("name").and_then(|n| n.as_str()) {
            Some(name) => name,
            None => continue,
        };
        let kind = item.get("type").and_then(|t| t.as_str());
        let subname = item.get("subname").and_then(|s| s.as_str()).unwrap_or("");
        let value = item.get("value").cloned().unwrap_or(Value::Null);
        if kind == Some("group") {
            config.insert(name.to_string(), Value::Object(Map::new()));
        } else if !subname.is_empty() {
            if let Some(Value::Object(group)) = config.get_mut(name) {
                group.insert(subname.to_string(), value);
            }
        } else {
            config.insert(name.to_string(), value);
        }
    }
    Value::Object(config)
}

/// Apply a caller diff onto derived defaults, schema-aware: only keys
/// the schema declares are touched.
fn apply_config_diff(schema: Option<&Value>, config: &mut Value, diff: &Value) {
    let items = schema
        .and_then(|s| s.get("config"))
        .and_then(|c| c.as_array())
        .cloned()
        .unwrap_or_default();
    for item in &items {
        if item.get("type").and_then(|t| t.as_str()) == Some("group") {
            continue;
        }
        let name = match item.get("name").and_then(|n| n.as_str()) {
            Some(name) => name,
            None => continue,
        };
        let subname = item.get("subname").and_then(|s| s.as_str()).unwrap_or("");
        if subname.is_empty() {
            if let Some(value) = diff.get(name) {
                config[name] = value.clone();
            }
        } else if let Some(value) = diff.get(name).and_then(|g| g.get(subname)) {
            config[name][subname] = value.clone();
        }
    }
}

impl Obj<ActionRecord> {
    /// Run this action, returning the created task.
    ///
    /// A `409 Conflict` whose description reports unresolved issues on
    /// the target object maps to [`Error::ActionHasIssues`]; any other
    /// server error propagates unchanged.
    pub async fn run(&mut self, params: RunParams) -> Result<Task> {
        if params.config.is_some() && params.config_diff.is_some() {
            return Err(Error::Argument(
                "only one of 'config' and 'config_diff' may be given".to_string(),
            ));
        }

        let schema = self.record().await?.config.clone();
        let config = match params.config {
            Some(config) => config,
            None => {
                let mut config = config_defaults(schema.as_ref());
                if let Some(diff) = &params.config_diff {
                    apply_config_diff(schema.as_ref(), &mut config, diff);
                }
                config
            }
        };

        let mut body = Map::new();
        body.insert("config".to_string(), config);
        if let Some(hc) = params.hostcomponent {
            body.insert("hc".to_string(), hc);
        }

        // Older servers reject unknown run arguments, so `verbose` is
        // only sent where supported.
        let supports_verbose = version::select(
            self.client().server_version(),
            ACTION_VERBOSE_SINCE,
            true,
            false,
        );
        if supports_verbose {
            body.insert("verbose".to_string(), json!(params.verbose.unwrap_or(false)));
        } else if params.verbose.is_some() {
            tracing::warn!(
                "server {} does not support the 'verbose' run argument, skipping it",
                self.client().server_version()
            );
        }

        let response = self
            .subcall(&["run"], Method::POST, Some(&Value::Object(body)))
            .await
            .map_err(|err| match &err {
                Error::Api {
                    status: 409, desc, ..
                } if desc.contains("has issues") => Error::ActionHasIssues,
                _ => err,
            })?;

        let id = created_id(TaskRecord::KIND, &response)?;
        self.client().task(id)
    }

    /// One task spawned by this action.
    pub async fn task_find(&self, filter: Filter) -> Result<Task> {
        self.child_find(filter).await
    }

    /// Tasks spawned by this action.
    pub fn task_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<TaskRecord>> {
        self.child_collection(filter, paging)
    }
}

// Shared action surface for every entity that declares actions.
impl<E: WithActions> Obj<E> {
    /// A handle to one of this object's actions.
    pub fn action(&self, id: u64) -> Result<Action> {
        self.subobject(id)
    }

    /// The single action matching `filter` (typically `name`).
    pub async fn action_find(&self, filter: Filter) -> Result<Action> {
        self.sub_find(filter).await
    }

    /// All actions available on this object.
    pub fn action_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<ActionRecord>> {
        self.sub_collection(filter, paging)
    }

    /// Look an action up by name and run it.
    pub async fn action_run(&self, name: &str, params: RunParams) -> Result<Task> {
        let mut action = self.action_find(Filter::new().field("name", name)).await?;
        action.run(params).await
    }
}
