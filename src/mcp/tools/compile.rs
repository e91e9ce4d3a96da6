use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use super::{ToolContext, parse_arguments, tool_result, workspace_path_property};
use crate::java::{JavaCompileRequest, JunitCompileRequest, java_compile, junit_compile};
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool};
use crate::mcp::server::ToolHandler;

const CLASSPATH_DESCRIPTION: &str =
    "List of jar files or patterns (e.g. path/to/a.jar:path/to/lib/*)";

/// `java_compile`: compile application sources with javac
pub struct JavaCompileHandler {
    context: ToolContext,
}

impl JavaCompileHandler {
    #[inline]
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "java_compile".to_string(),
            description: Some("Compile Java source files".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source_files": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of Java source files or patterns (e.g. src/Hello.java, src/**/*.java)"
                    },
                    "classpath": {
                        "type": "string",
                        "description": CLASSPATH_DESCRIPTION
                    },
                    "output_dir": {
                        "type": "string",
                        "description": "Directory to output compiled classes (default: main/bin)"
                    },
                    "workspace_path": workspace_path_property()
                },
                "required": ["source_files"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for JavaCompileHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let arguments = params.arguments.unwrap_or_default();
        let ctx = self.context.execution_context(&arguments);
        let request: JavaCompileRequest = parse_arguments("java_compile", arguments)?;

        Ok(tool_result("java_compile", java_compile(&ctx, &request).await))
    }
}

/// `junit_compile`: compile test sources against the compiled classes
pub struct JunitCompileHandler {
    context: ToolContext,
}

impl JunitCompileHandler {
    #[inline]
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "junit_compile".to_string(),
            description: Some("Compile JUnit source files".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source_files": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of JUnit source files or patterns (e.g. src/HelloTest.java, src/**/*Test.java)"
                    },
                    "classpath": {
                        "type": "string",
                        "description": CLASSPATH_DESCRIPTION
                    },
                    "target_dir": {
                        "type": "string",
                        "description": "Compiled class directory to test (default: main/bin)"
                    },
                    "test_dir": {
                        "type": "string",
                        "description": "Directory to output JUnit classes (default: test/bin)"
                    },
                    "workspace_path": workspace_path_property()
                },
                "required": ["source_files"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for JunitCompileHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let arguments = params.arguments.unwrap_or_default();
        let ctx = self.context.execution_context(&arguments);
        let request: JunitCompileRequest = parse_arguments("junit_compile", arguments)?;

        Ok(tool_result(
            "junit_compile",
            junit_compile(&ctx, &request).await,
        ))
    }
}
