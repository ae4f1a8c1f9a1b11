use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Level of detail returned for a single work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemExpand {
    #[serde(alias = "None")]
    None,
    #[serde(alias = "Relations")]
    Relations,
    #[serde(alias = "Fields")]
    Fields,
    #[serde(alias = "Links")]
    Links,
    #[default]
    #[serde(alias = "All")]
    All,
}

impl WorkItemExpand {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemExpand::None => "none",
            WorkItemExpand::Relations => "relations",
            WorkItemExpand::Fields => "fields",
            WorkItemExpand::Links => "links",
            WorkItemExpand::All => "all",
        }
    }
}

/// Batch lookups use `errorPolicy=omit`, which leaves `null` in place of
/// work items that no longer exist.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkItemListResponse {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub value: Vec<Option<WorkItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<u32>,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<WorkItemRelation>>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemRelation {
    pub rel: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<HashMap<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WiqlQuery {
    pub query: String,
}

/// Flat queries fill `workItems`; link queries only return relations, so it may be absent.
#[derive(Debug, Serialize, Deserialize)]
pub struct WiqlResponse {
    #[serde(rename = "workItems", default)]
    pub work_items: Vec<WorkItemReference>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkItemReference {
    pub id: u32,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonPatchOperation {
    pub op: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl JsonPatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: "add".to_string(),
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn add_field(field: &str, value: Value) -> Self {
        Self::add(format!("/fields/{}", field), value)
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: "remove".to_string(),
            path: path.into(),
            value: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IdentityListResponse {
    #[serde(default)]
    pub value: Vec<Identity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "providerDisplayName", default)]
    pub provider_display_name: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, IdentityProperty>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IdentityProperty {
    #[serde(rename = "$value", default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogEntry {
    #[serde(default)]
    pub id: String,
    pub minutes: f64,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub user_id: String,
    pub date: String,
    #[serde(default)]
    pub date_week: String,
    pub work_item_id: u32,
    #[serde(rename = "type", default)]
    pub log_type: String,
    #[serde(default)]
    pub comment: String,
}

/// Document list returned by the extension data service. Entries are kept raw
/// so one malformed document does not fail the whole read.
#[derive(Debug, Deserialize)]
pub struct TimeLogApiResponse {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub value: Vec<Value>,
}
