// ABOUTME: The configuration document (config.json): free-form settings plus stored API tokens.
// ABOUTME: Token verification lives with the HTTP layer; this type only carries the persisted records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::{Document, SCHEMA_VERSION};

/// A stored API token. Only the hash is persisted, never the raw secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiToken {
    pub name: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiToken {
    pub fn new(name: String, hash: String) -> Self {
        Self {
            name,
            hash,
            created_at: Utc::now(),
            last_used_at: None,
            extra: Map::new(),
        }
    }
}

/// Application configuration: `{schemaVersion, settings, tokens}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub schema_version: String,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    #[serde(default)]
    pub tokens: BTreeMap<String, ApiToken>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            settings: BTreeMap::new(),
            tokens: BTreeMap::new(),
        }
    }
}

impl Document for ConfigDocument {
    const FILE_NAME: &'static str = "config.json";

    fn schema_version(&self) -> &str {
        &self.schema_version
    }
}

impl ConfigDocument {
    /// Look up a setting and decode it into `T`. Missing or mistyped
    /// settings both yield `None`.
    pub fn setting<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.settings
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: Value) {
        self.settings.insert(key.into(), value);
    }
}
