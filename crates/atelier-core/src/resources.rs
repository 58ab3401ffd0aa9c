// ABOUTME: The resource catalog document (resources.json): providers, models, and prompt templates.
// ABOUTME: Each collection maps a stable string id to its record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::{Document, SCHEMA_VERSION};

/// A generation backend the application can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,
    /// Backend family, e.g. `openai`, `replicate`, `local`.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    pub provider_id: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub name: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resource catalog: `{schemaVersion, providers, models, templates}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesDocument {
    pub schema_version: String,
    #[serde(default)]
    pub providers: BTreeMap<String, Provider>,
    #[serde(default)]
    pub models: BTreeMap<String, Model>,
    #[serde(default)]
    pub templates: BTreeMap<String, PromptTemplate>,
}

impl Default for ResourcesDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            providers: BTreeMap::new(),
            models: BTreeMap::new(),
            templates: BTreeMap::new(),
        }
    }
}

impl Document for ResourcesDocument {
    const FILE_NAME: &'static str = "resources.json";

    fn schema_version(&self) -> &str {
        &self.schema_version
    }
}

impl ResourcesDocument {
    /// All models served by the given provider, as `(model_id, model)` pairs.
    pub fn models_for_provider<'a>(
        &'a self,
        provider_id: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Model)> + 'a {
        self.models
            .iter()
            .filter(move |(_, m)| m.provider_id == provider_id)
            .map(|(id, m)| (id.as_str(), m))
    }
}
