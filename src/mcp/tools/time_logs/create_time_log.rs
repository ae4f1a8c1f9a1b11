use crate::azure::time_logs::{self, CreateTimeLogOptions};
use crate::azure::client::AzureDevOpsClient;
use crate::mcp::tools::support::{deserialize_non_empty_string, json_result, to_mcp_error};
use rmcp::{
    ErrorData as McpError,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    serde::Deserialize,
};

/// Categories accepted by the time logging extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
pub enum TimeLogType {
    Administration,
    Analysis,
    Deployment,
    Design,
    #[serde(rename = "Development - Production Support")]
    DevelopmentProductionSupport,
    #[serde(rename = "Development - Project")]
    DevelopmentProject,
    Documentation,
    #[serde(rename = "Leave - Annual")]
    LeaveAnnual,
    #[serde(rename = "Leave - Other")]
    LeaveOther,
    #[serde(rename = "Leave - Sick")]
    LeaveSick,
    #[serde(rename = "Lost Time")]
    LostTime,
    Meeting,
    Planning,
    #[serde(rename = "Public Holiday")]
    PublicHoliday,
    Research,
    #[serde(rename = "Routine Support")]
    RoutineSupport,
    #[serde(rename = "Self Training")]
    SelfTraining,
    Testing,
    #[serde(rename = "Time Off")]
    TimeOff,
    Training,
    Troubleshooting,
    #[serde(rename = "User Support")]
    UserSupport,
}

impl TimeLogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeLogType::Administration => "Administration",
            TimeLogType::Analysis => "Analysis",
            TimeLogType::Deployment => "Deployment",
            TimeLogType::Design => "Design",
            TimeLogType::DevelopmentProductionSupport => "Development - Production Support",
            TimeLogType::DevelopmentProject => "Development - Project",
            TimeLogType::Documentation => "Documentation",
            TimeLogType::LeaveAnnual => "Leave - Annual",
            TimeLogType::LeaveOther => "Leave - Other",
            TimeLogType::LeaveSick => "Leave - Sick",
            TimeLogType::LostTime => "Lost Time",
            TimeLogType::Meeting => "Meeting",
            TimeLogType::Planning => "Planning",
            TimeLogType::PublicHoliday => "Public Holiday",
            TimeLogType::Research => "Research",
            TimeLogType::RoutineSupport => "Routine Support",
            TimeLogType::SelfTraining => "Self Training",
            TimeLogType::Testing => "Testing",
            TimeLogType::TimeOff => "Time Off",
            TimeLogType::Training => "Training",
            TimeLogType::Troubleshooting => "Troubleshooting",
            TimeLogType::UserSupport => "User Support",
        }
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeLogArgs {
    /// Time spent in minutes
    pub minutes: u32,
    /// Date of the work in YYYY-MM-DD format
    #[serde(deserialize_with = "deserialize_non_empty_string")]
    pub date: String,
    /// Work item the time is logged against
    pub work_item_id: u32,
    /// Time log category
    #[serde(rename = "type")]
    pub log_type: TimeLogType,
    /// What the time was spent on
    #[serde(deserialize_with = "deserialize_non_empty_string")]
    pub comment: String,
}

pub async fn create_time_log(
    client: &AzureDevOpsClient,
    args: CreateTimeLogArgs,
) -> Result<CallToolResult, McpError> {
    log::info!(
        "Tool invoked: create_time_log(minutes={}, date={}, work_item={}, type={})",
        args.minutes,
        args.date,
        args.work_item_id,
        args.log_type.as_str()
    );

    let options = CreateTimeLogOptions {
        minutes: args.minutes,
        date: args.date,
        work_item_id: args.work_item_id,
        log_type: args.log_type.as_str().to_string(),
        comment: args.comment,
    };

    let entry = time_logs::create_time_log(client, &options)
        .await
        .map_err(to_mcp_error)?;
    json_result(&entry)
}
