use crate::azure::client::AzureError;
use crate::config::ConfigError;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content, ErrorCode},
};
use serde::Serialize;

/// Invalid input is reported as invalid params, everything else as a server error.
pub fn to_mcp_error(error: AzureError) -> McpError {
    let code = match error {
        AzureError::Validation(_) | AzureError::Config(ConfigError::Missing(_)) => {
            ErrorCode(-32602)
        }
        _ => ErrorCode(-32000),
    };
    McpError {
        code,
        message: error.to_string().into(),
        data: None,
    }
}

/// Pretty-printed JSON tool result.
pub fn json_result(value: &impl Serialize) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| McpError {
        code: ErrorCode(-32000),
        message: format!("Failed to serialize result: {}", e).into(),
        data: None,
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_invalid_params() {
        let err = to_mcp_error(AzureError::Validation("Title is required".into()));
        assert_eq!(err.code, ErrorCode(-32602));
        assert_eq!(err.message, "Validation failed: Title is required");

        let err = to_mcp_error(AzureError::NotFound("Work item '9' not found".into()));
        assert_eq!(err.code, ErrorCode(-32000));

        let err = to_mcp_error(ConfigError::Missing("projectName").into());
        assert_eq!(err.code, ErrorCode(-32602));
    }
}
