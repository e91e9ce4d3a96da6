//! MCP (Model Context Protocol) Server Implementation
//!
//! A JSON-RPC 2.0 server over newline-delimited streams exposing the Java
//! toolchain as MCP tools.


pub mod errors;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod validation;

pub use server::{ConnectionState, McpServer, MessageHandler, ToolHandler};
pub use tools::{ToolContext, register_tools};

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "java_test_mcp";

/// Server with every Java tool registered
#[inline]
pub async fn build_server(context: &ToolContext) -> anyhow::Result<McpServer> {
    let server = McpServer::new(
        SERVER_NAME.to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    )?;
    register_tools(&server, context).await?;
    Ok(server)
}
