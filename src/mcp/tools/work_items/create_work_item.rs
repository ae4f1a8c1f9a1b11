use crate::azure::work_items::{self, WorkItemFields};
use crate::azure::client::AzureDevOpsClient;
use crate::mcp::tools::support::{
    deserialize_non_empty_string, deserialize_optional_non_empty_string, json_result,
    simplify_work_item_json, to_mcp_error,
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
pub struct CreateWorkItemArgs {
    /// AzDO project name (defaults to the configured project)
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub project_name: Option<String>,
    /// Work item type, e.g. "Task", "Bug", "User Story"
    #[serde(deserialize_with = "deserialize_non_empty_string")]
    pub work_item_type: String,
    /// Title
    pub title: String,
    /// Description (HTML)
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
    /// Original estimate in hours. Required when workItemType is "Task".
    #[serde(default)]
    pub original_estimate: Option<f64>,
    /// ID of the parent work item
    #[serde(default)]
    pub parent_id: Option<u32>,
    /// Extra fields keyed by reference name, e.g. {"Microsoft.VSTS.Common.ValueArea": "Business"}
    #[serde(default)]
    pub additional_fields: Option<Map<String, Value>>,
}

pub async fn create_work_item(
    client: &AzureDevOpsClient,
    args: CreateWorkItemArgs,
) -> Result<CallToolResult, McpError> {
    log::info!(
        "Tool invoked: create_work_item(project={:?}, type={}, title={}, parent={:?})",
        args.project_name,
        args.work_item_type,
        args.title,
        args.parent_id
    );

    let project = client
        .config()
        .resolve_project(args.project_name.as_deref())
        .map_err(|e| to_mcp_error(e.into()))?;

    let fields = WorkItemFields {
        title: Some(args.title),
        description: args.description,
        assigned_to: args.assigned_to,
        area_path: args.area_path,
        iteration_path: args.iteration_path,
        priority: args.priority,
        state: None,
        original_estimate: args.original_estimate,
        additional_fields: args.additional_fields.unwrap_or_default(),
    };

    let work_item = work_items::create_work_item(
        client,
        &project,
        &args.work_item_type,
        &fields,
        args.parent_id,
    )
    .await
    .map_err(to_mcp_error)?;

    let mut json_value = serde_json::to_value(&work_item).map_err(|e| to_mcp_error(e.into()))?;
    simplify_work_item_json(&mut json_value);
    json_result(&json_value)
}
