use crate::azure::time_logs::{self, ReadTimeLogOptions};
use crate::azure::client::AzureDevOpsClient;
use crate::mcp::tools::support::{deserialize_optional_non_empty_string, json_result, to_mcp_error};
use rmcp::{
    ErrorData as McpError,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    serde::Deserialize,
};

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadTimeLogsArgs {
    /// Earliest date to include, YYYY-MM-DD
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub date_from: Option<String>,
    /// Latest date to include, YYYY-MM-DD
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub date_to: Option<String>,
    /// ISO week, e.g. 2024-W11
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub date_week: Option<String>,
    /// Only entries logged against these work items
    #[serde(default)]
    pub work_item_ids: Option<Vec<u32>>,
}

pub async fn read_time_logs(
    client: &AzureDevOpsClient,
    args: ReadTimeLogsArgs,
) -> Result<CallToolResult, McpError> {
    log::info!(
        "Tool invoked: read_time_logs(from={:?}, to={:?}, week={:?}, work_items={:?})",
        args.date_from,
        args.date_to,
        args.date_week,
        args.work_item_ids
    );

    let options = ReadTimeLogOptions {
        date_from: args.date_from,
        date_to: args.date_to,
        date_week: args.date_week,
        work_item_ids: args.work_item_ids.unwrap_or_default(),
    };

    let entries = time_logs::read_time_logs(client, &options)
        .await
        .map_err(to_mcp_error)?;
    json_result(&entries)
}
