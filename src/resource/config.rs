//! Configuration document access
//!
//! Configurable entities carry a nested configuration document: a
//! mapping keyed by group name, then by field name, with an attributes
//! document alongside. The current config lives at
//! `{instance}/config/current/`; writes create a new history entry at
//! `{instance}/config/history/`.

use reqwest::Method;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::resource::object::{Configurable, Obj};

/// Recursively merge `diff` into `base`: nested maps merge key by key,
/// everything else replaces. An empty diff leaves `base` untouched.
pub(crate) fn deep_update(base: &mut Value, diff: &Value) {
    match (base, diff) {
        (Value::Object(base_map), Value::Object(diff_map)) => {
            for (key, value) in diff_map {
                match base_map.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_update(existing, value);
                    }
                    _ => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, diff) => *base = diff.clone(),
    }
}

impl<E: Configurable> Obj<E> {
    /// The current config values (group -> field -> value).
    pub async fn config(&self) -> Result<Value> {
        let entry = self.subcall(&["config", "current"], Method::GET, None).await?;
        entry
            .get("config")
            .cloned()
            .ok_or_else(|| Error::Protocol(format!("{} config entry has no config key", E::KIND)))
    }

    /// The full current history entry, config plus attributes.
    pub async fn config_full(&self) -> Result<Value> {
        self.subcall(&["config", "current"], Method::GET, None).await
    }

    /// Write a complete config as a new history entry.
    ///
    /// `data` is either the bare value document, or a full entry with
    /// `config` and `attr` keys (a null `attr` is sent as `{}`).
    pub async fn config_set(&self, data: Value) -> Result<Value> {
        let is_full = data.get("config").is_some() && data.get("attr").is_some();
        let body = if is_full {
            let config = data.get("config").cloned().unwrap_or(Value::Null);
            let attr = match data.get("attr") {
                Some(Value::Null) | None => Value::Object(Map::new()),
                Some(attr) => attr.clone(),
            };
            json!({ "config": config, "attr": attr })
        } else {
            json!({ "config": data })
        };

        let entry = self
            .subcall(&["config", "history"], Method::POST, Some(&body))
            .await?;

        if is_full {
            let mut out = Map::new();
            for key in ["config", "attr"] {
                if let Some(value) = entry.get(key) {
                    out.insert(key.to_string(), value.clone());
                }
            }
            Ok(Value::Object(out))
        } else {
            entry.get("config").cloned().ok_or_else(|| {
                Error::Protocol(format!("{} config entry has no config key", E::KIND))
            })
        }
    }

    /// Merge `diff` into the current config and write the result.
    ///
    /// This reads the current state, merges client-side and writes it
    /// back with no compare-and-swap token, so it is racy against
    /// concurrent writers; last write wins on the server. An empty diff
    /// rewrites the config unchanged.
    pub async fn config_set_diff(&self, diff: Value) -> Result<Value> {
        let is_full = diff.get("config").is_some() && diff.get("attr").is_some();
        let mut current = if is_full {
            self.config_full().await?
        } else {
            self.config().await?
        };
        deep_update(&mut current, &diff);
        self.config_set(current).await
    }
}
