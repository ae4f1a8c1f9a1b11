use crate::azure::work_items::{self, ListWorkItemsOptions};
use crate::azure::client::AzureDevOpsClient;
use crate::mcp::tools::support::{
    deserialize_optional_non_empty_string, simplify_work_item_json, to_mcp_error,
    work_items_to_csv,
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content, ErrorCode},
    schemars::{self, JsonSchema},
    serde::Deserialize,
};

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListWorkItemsArgs {
    /// AzDO project name (defaults to the configured project)
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub project_name: Option<String>,
    /// Team ID or name, used as query context
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub team_id: Option<String>,
    /// ID of a saved work item query; takes precedence over wiql
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub query_id: Option<String>,
    /// WIQL query. Only select System.Id. Use displayName to filter by System.AssignedTo.
    /// It is scoped to the project automatically.
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub wiql: Option<String>,
    /// Maximum number of work items to return (default 200)
    #[serde(default)]
    pub top: Option<usize>,
    /// Number of work items to skip
    #[serde(default)]
    pub skip: Option<usize>,
}

pub async fn list_work_items(
    client: &AzureDevOpsClient,
    args: ListWorkItemsArgs,
) -> Result<CallToolResult, McpError> {
    log::info!(
        "Tool invoked: list_work_items(project={:?}, team={:?}, query_id={:?}, wiql={:?}, top={:?}, skip={:?})",
        args.project_name,
        args.team_id,
        args.query_id,
        args.wiql,
        args.top,
        args.skip,
    );

    let project = client
        .config()
        .resolve_project(args.project_name.as_deref())
        .map_err(|e| to_mcp_error(e.into()))?;

    let options = ListWorkItemsOptions {
        project,
        team: args.team_id,
        query_id: args.query_id,
        wiql: args.wiql,
        top: args.top,
        skip: args.skip,
    };

    let items = work_items::list_work_items(client, &options)
        .await
        .map_err(to_mcp_error)?;

    // Convert to JSON value, simplify, then convert to CSV
    let mut json_value = serde_json::to_value(&items).map_err(|e| to_mcp_error(e.into()))?;
    simplify_work_item_json(&mut json_value);
    let csv_output = work_items_to_csv(&json_value).map_err(|e| McpError {
        code: ErrorCode(-32000),
        message: format!("Failed to convert to CSV: {}", e).into(),
        data: None,
    })?;

    Ok(CallToolResult::success(vec![Content::text(csv_output)]))
}
