use crate::azure::work_items::{self, WorkItemFields};
use crate::azure::client::AzureDevOpsClient;
use crate::mcp::tools::support::{
    deserialize_optional_non_empty_string, json_result, simplify_work_item_json, to_mcp_error,
};
use rmcp::{
    ErrorData as McpError,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    serde::Deserialize,
};
use serde_json::{Map, Value};

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkItemArgs {
    /// Work item ID
    pub work_item_id: u32,
    /// New title
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub title: Option<String>,
    /// New description (HTML)
    #[serde(default)]
    pub description: Option<String>,
    /// Assigned to (display name or email)
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub assigned_to: Option<String>,
    /// Area path
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub area_path: Option<String>,
    /// Iteration path
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub iteration_path: Option<String>,
    /// Priority (1-4)
    #[serde(default)]
    pub priority: Option<u32>,
    /// State, e.g. "Active" or "Closed"
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub state: Option<String>,
    /// Extra fields keyed by reference name
    #[serde(default)]
    pub additional_fields: Option<Map<String, Value>>,
}

pub async fn update_work_item(
    client: &AzureDevOpsClient,
    args: UpdateWorkItemArgs,
) -> Result<CallToolResult, McpError> {
    log::info!("Tool invoked: update_work_item(id={})", args.work_item_id);

    let fields = WorkItemFields {
        title: args.title,
        description: args.description,
        assigned_to: args.assigned_to,
        area_path: args.area_path,
        iteration_path: args.iteration_path,
        priority: args.priority,
        state: args.state,
        original_estimate: None,
        additional_fields: args.additional_fields.unwrap_or_default(),
    };

    let work_item = work_items::update_work_item(client, args.work_item_id, &fields)
        .await
        .map_err(to_mcp_error)?;

    let mut json_value = serde_json::to_value(&work_item).map_err(|e| to_mcp_error(e.into()))?;
    simplify_work_item_json(&mut json_value);
    json_result(&json_value)
}
