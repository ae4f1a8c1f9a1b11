use crate::azure::models::WorkItemExpand;
use crate::azure::{client::AzureDevOpsClient, work_items};
use crate::mcp::tools::support::{json_result, simplify_work_item_json, to_mcp_error};
use rmcp::{
    ErrorData as McpError,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    serde::Deserialize,
};

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetWorkItemArgs {
    /// Work item ID
    pub work_item_id: u32,
    /// Level of detail to include (none, relations, fields, links, all). Defaults to all.
    #[serde(default)]
    pub expand: Option<WorkItemExpand>,
}

pub async fn get_work_item(
    client: &AzureDevOpsClient,
    args: GetWorkItemArgs,
) -> Result<CallToolResult, McpError> {
    log::info!(
        "Tool invoked: get_work_item(id={}, expand={:?})",
        args.work_item_id,
        args.expand
    );
    let work_item = work_items::get_work_item(
        client,
        args.work_item_id,
        args.expand.unwrap_or_default(),
    )
    .await
    .map_err(to_mcp_error)?;

    // Convert to JSON value, simplify, then serialize
    let mut json_value = serde_json::to_value(&work_item).map_err(|e| to_mcp_error(e.into()))?;
    simplify_work_item_json(&mut json_value);
    json_result(&json_value)
}
