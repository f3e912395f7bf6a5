//! Config manifests, items and conditions

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::env::EnvStore;
use crate::types::TerminalStatus;

/// Guard deciding whether an item runs
///
/// Written as a variable name, or `!NAME` to invert. Empty means always.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Always,
    /// Variable must be bound to a non-empty value
    IfSet(String),
    /// Variable must be unbound or empty
    IfUnset(String),
}

impl Condition {
    pub fn parse(expr: &str) -> Self {
        if expr.is_empty() {
            Self::Always
        } else if let Some(name) = expr.strip_prefix('!') {
            Self::IfUnset(name.to_string())
        } else {
            Self::IfSet(expr.to_string())
        }
    }

    pub fn holds(&self, env: &EnvStore) -> bool {
        match self {
            Self::Always => true,
            Self::IfSet(name) => env.is_set(name),
            Self::IfUnset(name) => !env.is_set(name),
        }
    }
}

/// One manifest entry binding a resource to options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    /// Unique name of the item
    pub name: String,
    /// Name of the resource this item invokes
    pub resource: String,
    #[serde(default)]
    pub condition: String,
    /// Option name -> value, exported to the resource's commands
    #[serde(default, deserialize_with = "deserialize_scalar_map")]
    pub options: BTreeMap<String, String>,
    /// Written once by the run that visits this item
    #[serde(default)]
    pub state: TerminalStatus,
}

impl ConfigItem {
    pub fn new(name: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            ..Default::default()
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn guard(&self) -> Condition {
        Condition::parse(&self.condition)
    }
}

/// An ordered list of config items plus metadata
///
/// Item order is the execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigManifest {
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    /// Descriptive only; runs do not evaluate it
    pub condition: String,
    pub items: Vec<ConfigItem>,
}

impl ConfigManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_item(mut self, item: ConfigItem) -> Self {
        self.items.push(item);
        self
    }

    /// Items the run never reached
    pub fn not_run(&self) -> impl Iterator<Item = &ConfigItem> {
        self.items
            .iter()
            .filter(|i| i.state == TerminalStatus::NotRun)
    }
}

/// Deserialize a flat map whose values may be any scalar
///
/// Values end up in environment variables, so `port: 8080` and
/// `version: 1.10` are kept exactly as written. A null value is empty.
pub fn deserialize_scalar_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (k, v.unwrap_or_default()))
        .collect())
}
