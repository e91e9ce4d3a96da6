use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use super::{ToolContext, parse_arguments, tool_result, workspace_path_property};
use crate::java::{ReportCoverageRequest, report_coverage};
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool};
use crate::mcp::server::ToolHandler;

/// `report_coverage`: render `jacoco.exec` and summarise line coverage
pub struct ReportCoverageHandler {
    context: ToolContext,
}

impl ReportCoverageHandler {
    #[inline]
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "report_coverage".to_string(),
            description: Some("Generate Jacoco coverage report".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "classfiles_dir": {
                        "type": "string",
                        "description": "Compiled class directory to test (default: main/bin)"
                    },
                    "package_name": {
                        "type": "string",
                        "description": "Report target (e.g. com.example.report.target)"
                    },
                    "workspace_path": workspace_path_property()
                },
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for ReportCoverageHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let arguments = params.arguments.unwrap_or_default();
        let ctx = self.context.execution_context(&arguments);
        let request: ReportCoverageRequest = parse_arguments("report_coverage", arguments)?;

        Ok(tool_result(
            "report_coverage",
            report_coverage(&ctx, &request).await,
        ))
    }
}
