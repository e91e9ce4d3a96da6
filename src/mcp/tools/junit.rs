use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use super::{ToolContext, parse_arguments, tool_result, workspace_path_property};
use crate::java::{RunJunitRequest, run_junit};
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool};
use crate::mcp::server::ToolHandler;

/// `run_junit`: run tests through the console launcher with the JaCoCo agent
pub struct RunJunitHandler {
    context: ToolContext,
}

impl RunJunitHandler {
    #[inline]
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "run_junit".to_string(),
            description: Some("Execute JUnit tests".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "classpath": {
                        "type": "string",
                        "description": "List of jar files or patterns (e.g. path/to/a.jar:path/to/lib/*)"
                    },
                    "target_dir": {
                        "type": "string",
                        "description": "Compiled class directory to test (default: main/bin)"
                    },
                    "test_dir": {
                        "type": "string",
                        "description": "Directory holding the compiled JUnit classes (default: test/bin)"
                    },
                    "package_name": {
                        "type": "string",
                        "description": "Package measured by the coverage agent and prefixed to bare test class names"
                    },
                    "test_classes": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of specific test classes to run (optional)"
                    },
                    "workspace_path": workspace_path_property()
                },
                "required": ["target_dir"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for RunJunitHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let arguments = params.arguments.unwrap_or_default();
        let ctx = self.context.execution_context(&arguments);
        let request: RunJunitRequest = parse_arguments("run_junit", arguments)?;

        Ok(tool_result("run_junit", run_junit(&ctx, &request).await))
    }
}
