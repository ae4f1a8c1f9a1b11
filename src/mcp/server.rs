use crate::azure::client::AzureDevOpsClient;
use crate::mcp::tools::time_logs::{self, CreateTimeLogArgs, ReadTimeLogsArgs};
use crate::mcp::tools::users::{self, GetMeArgs};
use crate::mcp::tools::work_items::{
    self, CreateWorkItemArgs, GetWorkItemArgs, ListWorkItemsArgs, ManageWorkItemLinkArgs,
    UpdateWorkItemArgs,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AzureMcpServer {
    client: Arc<AzureDevOpsClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AzureMcpServer {
    pub fn new(client: AzureDevOpsClient) -> Self {
        Self {
            client: Arc::new(client),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "get_me",
        description = "Get the configured user's id, display name and email"
    )]
    async fn get_me(&self) -> Result<CallToolResult, McpError> {
        users::get_me(&self.client, GetMeArgs {}).await
    }

    #[tool(
        name = "list_work_items",
        description = "List work items of a project as CSV. Uses a saved query when queryId is given, else the WIQL query (always scoped to the project), else all work items of the project. Supports top/skip pagination."
    )]
    async fn list_work_items(
        &self,
        Parameters(args): Parameters<ListWorkItemsArgs>,
    ) -> Result<CallToolResult, McpError> {
        work_items::list_work_items(&self.client, args).await
    }

    #[tool(
        name = "get_work_item",
        description = "Get a work item by ID, including its fields and relations"
    )]
    async fn get_work_item(
        &self,
        Parameters(args): Parameters<GetWorkItemArgs>,
    ) -> Result<CallToolResult, McpError> {
        work_items::get_work_item(&self.client, args).await
    }

    #[tool(
        name = "create_work_item",
        description = "Create a work item (title required; originalEstimate required for Tasks). Optionally links it to a parent."
    )]
    async fn create_work_item(
        &self,
        Parameters(args): Parameters<CreateWorkItemArgs>,
    ) -> Result<CallToolResult, McpError> {
        work_items::create_work_item(&self.client, args).await
    }

    #[tool(
        name = "update_work_item",
        description = "Update fields of an existing work item. At least one field is required."
    )]
    async fn update_work_item(
        &self,
        Parameters(args): Parameters<UpdateWorkItemArgs>,
    ) -> Result<CallToolResult, McpError> {
        work_items::update_work_item(&self.client, args).await
    }

    #[tool(
        name = "manage_work_item_link",
        description = "Add, remove or change the type of a link between two work items (parent, child, related, duplicate, duplicate-of, predecessor, successor)"
    )]
    async fn manage_work_item_link(
        &self,
        Parameters(args): Parameters<ManageWorkItemLinkArgs>,
    ) -> Result<CallToolResult, McpError> {
        work_items::manage_work_item_link(&self.client, args).await
    }

    #[tool(
        name = "create_time_log",
        description = "Log time spent on a work item for the configured user"
    )]
    async fn create_time_log(
        &self,
        Parameters(args): Parameters<CreateTimeLogArgs>,
    ) -> Result<CallToolResult, McpError> {
        time_logs::create_time_log(&self.client, args).await
    }

    #[tool(
        name = "read_time_logs",
        description = "Read the configured user's time log entries, newest first. Filter by date range (YYYY-MM-DD), ISO week (YYYY-Www) or work item IDs."
    )]
    async fn read_time_logs(
        &self,
        Parameters(args): Parameters<ReadTimeLogsArgs>,
    ) -> Result<CallToolResult, McpError> {
        time_logs::read_time_logs(&self.client, args).await
    }
}

#[tool_handler]
impl rmcp::ServerHandler for AzureMcpServer {
    fn get_info(&self) -> ServerInfo {
        let organization = self.client.config().org_name();
        ServerInfo {
            server_info: Implementation {
                name: "azure-devops-timelogs-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Use these tools to work with Azure DevOps work items and time logs in the '{}' organization",
                organization
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
