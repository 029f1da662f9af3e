//! Wire types for the PLM REST API.
//!
//! Field names follow the server's camelCase JSON. Records returned by the
//! server keep any field this crate does not model in `extra`, so nothing is
//! lost when a record is read, modified and sent back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named property value. The server only deals in strings, numbers and flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Flag(b)
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

pub const DEFAULT_ITEM_TYPE: &str = "Item";
pub const DEFAULT_REVISION_ID: &str = "A";

/// Payload for `POST /restful/items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    pub revision_id: String,
    #[serde(default)]
    pub properties: Properties,
}

impl NewItem {
    /// New item with the server defaults: type `Item`, revision `A`.
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            name: None,
            description: None,
            item_type: DEFAULT_ITEM_TYPE.to_string(),
            revision_id: DEFAULT_REVISION_ID.to_string(),
            properties: Properties::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// Query options for `GET /restful/bom/{id}/structure`.
#[derive(Debug, Clone, PartialEq)]
pub struct BomQuery {
    /// Levels to expand, `-1` for all.
    pub levels: i32,
    pub revision_id: Option<String>,
}

impl Default for BomQuery {
    fn default() -> Self {
        Self {
            levels: -1,
            revision_id: None,
        }
    }
}

impl BomQuery {
    pub fn levels(levels: i32) -> Self {
        Self {
            levels,
            revision_id: None,
        }
    }

    pub(crate) fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("levels", self.levels.to_string()),
            ("includeProperties", "true".to_string()),
        ];
        if let Some(rev) = &self.revision_id {
            pairs.push(("revisionId", rev.clone()));
        }
        pairs
    }
}

/// Payload for `POST /restful/bom/{parent}/lines`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBomLine {
    pub child_id: String,
    pub quantity: f64,
    pub properties: Properties,
}

impl NewBomLine {
    pub fn new(child_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            child_id: child_id.into(),
            quantity,
            properties: Properties::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub properties: Properties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomStructure {
    #[serde(default)]
    pub lines: Vec<BomLine>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for `POST /restful/workflows/start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkflow {
    pub process_name: String,
    pub targets: Vec<String>,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskCompletion<'a> {
    pub decision: &'a str,
    pub comments: &'a str,
}

pub const DEFAULT_DATASET_TYPE: &str = "Text";
pub const DEFAULT_RELATION_TYPE: &str = "IMAN_specification";

/// A local file to attach to an item as a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub item_id: String,
    pub file_path: std::path::PathBuf,
    pub dataset_type: String,
    pub relation_type: String,
}

impl UploadRequest {
    pub fn new(item_id: impl Into<String>, file_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            item_id: item_id.into(),
            file_path: file_path.into(),
            dataset_type: DEFAULT_DATASET_TYPE.to_string(),
            relation_type: DEFAULT_RELATION_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server cap passed with every saved-query execution.
pub const SAVED_QUERY_MAX_RESULTS: u32 = 1000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SavedQuery<'a> {
    pub query_name: &'a str,
    pub parameters: &'a Map<String, Value>,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of a successful `POST /restful/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Envelopes for list responses; a missing key means an empty list.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultsEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParentsEnvelope {
    #[serde(default)]
    pub parents: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TasksEnvelope {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_item_serialises_with_server_defaults() {
        let item = NewItem::new("PUMP-1").with_property("weight", 12.5);
        let body = serde_json::to_value(&item).unwrap();
        assert_eq!(
            body,
            json!({
                "itemId": "PUMP-1",
                "type": "Item",
                "revisionId": "A",
                "properties": { "weight": 12.5 }
            })
        );
    }

    #[test]
    fn item_keeps_unknown_fields() {
        let item: Item = serde_json::from_value(json!({
            "itemId": "X-1",
            "type": "Part",
            "owner": "infodba",
            "properties": { "critical": "True", "count": 3 }
        }))
        .unwrap();
        assert_eq!(item.item_type.as_deref(), Some("Part"));
        assert_eq!(item.extra.get("owner"), Some(&json!("infodba")));
        assert_eq!(item.property("count"), Some(&PropertyValue::Number(3.0)));
    }

    #[test]
    fn bom_query_only_sends_revision_when_set() {
        let pairs = BomQuery::default().to_query_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("levels", "-1".to_string()));

        let with_rev = BomQuery {
            levels: 2,
            revision_id: Some("B".into()),
        };
        assert!(with_rev
            .to_query_pairs()
            .contains(&("revisionId", "B".to_string())));
    }

    #[test]
    fn missing_results_key_is_an_empty_list() {
        let env: ResultsEnvelope<Value> = serde_json::from_value(json!({})).unwrap();
        assert!(env.results.is_empty());
    }
}
