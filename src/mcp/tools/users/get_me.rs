use crate::azure::{client::AzureDevOpsClient, users};
use crate::mcp::tools::support::{json_result, to_mcp_error};
use rmcp::{
    ErrorData as McpError,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    serde::Deserialize,
};

#[derive(Deserialize, JsonSchema)]
pub struct GetMeArgs {}

pub async fn get_me(
    client: &AzureDevOpsClient,
    _args: GetMeArgs,
) -> Result<CallToolResult, McpError> {
    log::info!("Tool invoked: get_me");
    let profile = users::get_me(client).await.map_err(to_mcp_error)?;
    json_result(&profile)
}
