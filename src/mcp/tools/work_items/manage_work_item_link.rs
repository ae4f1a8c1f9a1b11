use crate::azure::work_items::{self, LinkOperation, LinkOptions};
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

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LinkOperationArg {
    Add,
    Remove,
    Update,
}

impl From<LinkOperationArg> for LinkOperation {
    fn from(value: LinkOperationArg) -> Self {
        match value {
            LinkOperationArg::Add => LinkOperation::Add,
            LinkOperationArg::Remove => LinkOperation::Remove,
            LinkOperationArg::Update => LinkOperation::Update,
        }
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManageWorkItemLinkArgs {
    /// Work item the link starts from
    pub source_work_item_id: u32,
    /// Work item the link points to
    pub target_work_item_id: u32,
    /// add, remove or update
    pub operation: LinkOperationArg,
    /// Link type: parent, child, related, duplicate, duplicate-of, predecessor, successor,
    /// or a reference name such as "System.LinkTypes.Hierarchy-Reverse"
    #[serde(deserialize_with = "deserialize_non_empty_string")]
    pub relation_type: String,
    /// Replacement link type, required for update
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub new_relation_type: Option<String>,
    /// Link comment
    #[serde(default, deserialize_with = "deserialize_optional_non_empty_string")]
    pub comment: Option<String>,
}

pub async fn manage_work_item_link(
    client: &AzureDevOpsClient,
    args: ManageWorkItemLinkArgs,
) -> Result<CallToolResult, McpError> {
    log::info!(
        "Tool invoked: manage_work_item_link(source={}, target={}, operation={:?}, type={})",
        args.source_work_item_id,
        args.target_work_item_id,
        args.operation,
        args.relation_type
    );

    let options = LinkOptions {
        source_id: args.source_work_item_id,
        target_id: args.target_work_item_id,
        operation: args.operation.into(),
        relation_type: args.relation_type,
        new_relation_type: args.new_relation_type,
        comment: args.comment,
    };

    let work_item = work_items::manage_work_item_link(client, &options)
        .await
        .map_err(to_mcp_error)?;

    let mut json_value = serde_json::to_value(&work_item).map_err(|e| to_mcp_error(e.into()))?;
    simplify_work_item_json(&mut json_value);
    json_result(&json_value)
}
