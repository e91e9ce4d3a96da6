//! MCP Tools Implementation
//!
//! Tool definitions and handlers for the Java compile, test and coverage
//! tools, plus the shared context they run in.

pub mod compile;
pub mod coverage;
pub mod junit;

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::JavaTestError;
use crate::config::Config;
use crate::java::ExecutionContext;
use crate::mcp::protocol::CallToolResult;
use crate::mcp::server::McpServer;

pub use compile::{JavaCompileHandler, JunitCompileHandler};
pub use coverage::ReportCoverageHandler;
pub use junit::RunJunitHandler;

/// Argument every tool accepts to run against another workspace
pub const WORKSPACE_PATH_ARG: &str = "workspace_path";

/// State shared by all tool handlers
#[derive(Debug, Clone)]
pub struct ToolContext {
    config: Arc<Config>,
    additional_classpath: String,
}

impl ToolContext {
    #[inline]
    pub fn new(config: Arc<Config>, additional_classpath: String) -> Self {
        Self {
            config,
            additional_classpath,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execution context for one call, honouring a `workspace_path` argument
    #[inline]
    pub fn execution_context(&self, arguments: &Map<String, Value>) -> ExecutionContext {
        let ctx = ExecutionContext::from_config(&self.config, self.additional_classpath.clone());

        match arguments.get(WORKSPACE_PATH_ARG).and_then(Value::as_str) {
            Some(workspace) if !workspace.is_empty() => {
                debug!("Using workspace override {}", workspace);
                ctx.with_workspace(PathBuf::from(workspace))
            }
            _ => ctx,
        }
    }
}

/// Schema fragment for the `workspace_path` override
#[inline]
pub fn workspace_path_property() -> Value {
    json!({
        "type": "string",
        "description": "Workspace the relative paths are resolved against (default: CLIENT_WORKSPACE)"
    })
}

/// Decode tool arguments into a request type
#[inline]
pub fn parse_arguments<T>(tool: &str, arguments: Map<String, Value>) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| anyhow::anyhow!("Invalid arguments for {}: {}", tool, e))
}

/// Render an operation outcome as a tool result: pretty JSON on success,
/// the process failure or `Error: ...` otherwise.
#[inline]
pub fn tool_result<T: Serialize>(tool: &str, outcome: crate::Result<T>) -> CallToolResult {
    match outcome {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => CallToolResult::text(text),
            Err(e) => CallToolResult::error(format!("Error: {}", e)),
        },
        Err(error @ JavaTestError::CommandFailed { .. }) => {
            warn!("{} failed: {}", tool, error);
            CallToolResult::error(error.to_string())
        }
        Err(error) => {
            warn!("{} failed: {}", tool, error);
            CallToolResult::error(format!("Error: {}", error))
        }
    }
}

/// Register all four tools on `server`
#[inline]
pub async fn register_tools(server: &McpServer, context: &ToolContext) -> Result<()> {
    server
        .register_tool(
            JavaCompileHandler::tool_definition(),
            JavaCompileHandler::new(context.clone()),
        )
        .await?;
    server
        .register_tool(
            JunitCompileHandler::tool_definition(),
            JunitCompileHandler::new(context.clone()),
        )
        .await?;
    server
        .register_tool(
            RunJunitHandler::tool_definition(),
            RunJunitHandler::new(context.clone()),
        )
        .await?;
    server
        .register_tool(
            ReportCoverageHandler::tool_definition(),
            ReportCoverageHandler::new(context.clone()),
        )
        .await?;
    Ok(())
}
