//! MCP Server Implementation
//!
//! Connection handling and message routing for a newline-delimited JSON-RPC
//! stream. Requests are handled one at a time in arrival order.

use crate::mcp::errors::{McpError, error_response};
use crate::mcp::protocol::*;
use crate::mcp::validation::{McpValidator, compile_schema, recover_request_id, schema_violations};
use anyhow::Result;
use async_trait::async_trait;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

const INSTRUCTIONS: &str = "Compile Java sources and JUnit tests, run them under the JaCoCo agent \
and summarise line coverage. Paths are relative to the client workspace.";

/// MCP Server state and configuration
pub struct McpServer {
    pub server_info: Implementation,
    pub capabilities: ServerCapabilities,
    /// Registered tool definitions, listed in name order
    pub tools: Arc<RwLock<BTreeMap<String, Tool>>>,
    pub tool_handlers: Arc<RwLock<BTreeMap<String, RegisteredHandler>>>,
    pub connection_state: Arc<RwLock<ConnectionState>>,
    /// Minimum level requested by the client through `logging/setLevel`
    pub log_level: Arc<RwLock<LogLevel>>,
    pub validator: Arc<McpValidator>,
    started_at: Instant,
}

/// Connection state tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

/// Tool handler trait for implementing tool execution
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult>;
}

/// A tool handler with its compiled argument schema
pub struct RegisteredHandler {
    handler: Box<dyn ToolHandler>,
    arguments: Validator,
}

/// Message handler for processing incoming messages
pub struct MessageHandler {
    server: Arc<McpServer>,
}

impl McpServer {
    #[inline]
    pub fn new(name: String, version: String) -> Result<Self> {
        let server_info = Implementation { name, version };

        let capabilities = ServerCapabilities {
            logging: Some(LoggingCapability {}),
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        };

        Ok(Self {
            server_info,
            capabilities,
            tools: Arc::new(RwLock::new(BTreeMap::new())),
            tool_handlers: Arc::new(RwLock::new(BTreeMap::new())),
            connection_state: Arc::new(RwLock::new(ConnectionState::Uninitialized)),
            log_level: Arc::new(RwLock::new(LogLevel::Info)),
            validator: Arc::new(McpValidator::new()?),
            started_at: Instant::now(),
        })
    }

    /// Register a tool; its input schema is compiled for argument validation
    #[inline]
    pub async fn register_tool<H>(&self, tool: Tool, handler: H) -> Result<()>
    where
        H: ToolHandler + 'static,
    {
        let tool_name = tool.name.clone();
        let arguments = compile_schema(&tool.input_schema)?;

        {
            let mut tools = self.tools.write().await;
            tools.insert(tool_name.clone(), tool);
        }

        {
            let mut handlers = self.tool_handlers.write().await;
            handlers.insert(
                tool_name.clone(),
                RegisteredHandler {
                    handler: Box::new(handler),
                    arguments,
                },
            );
        }

        debug!("Registered tool: {}", tool_name);
        Ok(())
    }

    /// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`,
    /// until the reader is exhausted.
    #[inline]
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let handler = MessageHandler::new(Arc::clone(&self));

        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF reached, closing connection");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let raw_value: Value = match serde_json::from_str(line) {
                        Ok(value) => value,
                        Err(e) => {
                            let parse_error = McpError::ParseError {
                                message: e.to_string(),
                            };
                            parse_error.log();
                            self.send_message(&mut writer, &parse_error.to_error_response(None))
                                .await?;
                            continue;
                        }
                    };

                    match self.validator.validate_raw_message(&raw_value) {
                        Ok(message) => {
                            if let Err(e) = handler.process_message(message, &mut writer).await {
                                error!("Error processing message: {}", e);
                            }
                        }
                        Err(e) => {
                            let invalid = McpError::InvalidRequest {
                                message: format!("{:#}", e),
                            };
                            invalid.log();
                            self.send_message(
                                &mut writer,
                                &invalid.to_error_response(recover_request_id(&raw_value)),
                            )
                            .await?;
                        }
                    }
                }
                Err(e) => {
                    error!("Error reading input: {}", e);
                    break;
                }
            }
        }

        {
            let mut state = self.connection_state.write().await;
            *state = ConnectionState::Closed;
        }

        info!("MCP server stopped");
        Ok(())
    }

    /// Start the server using stdio transport
    #[inline]
    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        info!("Starting MCP server with stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    async fn send_message<W>(&self, writer: &mut W, message: &JsonRpcMessage) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let json = serde_json::to_string(message)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    #[inline]
    pub async fn connection_state(&self) -> ConnectionState {
        *self.connection_state.read().await
    }

    #[inline]
    pub async fn health_status(&self) -> ServerHealthStatus {
        ServerHealthStatus {
            connection_state: self.connection_state().await,
            tools_registered: self.tools.read().await.len(),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl MessageHandler {
    #[inline]
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }

    /// Process an incoming message
    #[inline]
    pub async fn process_message<W>(&self, message: JsonRpcMessage, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match message {
            JsonRpcMessage::Request(request) => self.handle_request(request, writer).await,
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification).await;
                Ok(())
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::ErrorResponse(_) => {
                warn!("Received unexpected response message from client");
                Ok(())
            }
        }
    }

    async fn handle_request<W>(&self, request: JsonRpcRequest, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        debug!("Handling request: {}", request.method);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "tools/list" => self.handle_list_tools().await,
            "tools/call" => self.handle_call_tool(request.params).await,
            "logging/setLevel" => self.handle_set_level(request.params).await,
            "ping" => Ok(json!({})),
            method => Err(McpError::MethodNotFound {
                method: method.to_string(),
            }
            .into()),
        };

        let message = match response {
            Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(result, request.id)),
            Err(e) => error_response(&e, Some(request.id)),
        };
        self.server.send_message(writer, &message).await
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => {
                let mut state = self.server.connection_state.write().await;
                *state = ConnectionState::Ready;
                info!("Server ready to handle requests");
            }
            "notifications/cancelled" => {
                // Requests run to completion; there is nothing to cancel
                debug!("Received cancellation notification");
            }
            _ => {
                warn!("Unknown notification method: {}", notification.method);
            }
        }
    }

    fn params<T>(&self, method: &str, params: Option<Value>) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let params = params.ok_or_else(|| McpError::InvalidParameters {
            message: format!("{} request missing parameters", method),
        })?;
        self.server
            .validator
            .validate_params(method, &params)
            .map_err(|e| McpError::InvalidParameters {
                message: e.to_string(),
            })?;
        Ok(serde_json::from_value(params).map_err(McpError::from)?)
    }

    /// Handle initialize request
    #[inline]
    pub async fn handle_initialize(&self, params: Option<Value>) -> Result<Value> {
        let params: InitializeParams = self.params("initialize", params)?;

        let protocol_version = negotiate_protocol_version(&params.protocol_version);
        if protocol_version != params.protocol_version {
            warn!(
                "Client requested protocol version {}, offering {}",
                params.protocol_version, protocol_version
            );
        }

        {
            let mut state = self.server.connection_state.write().await;
            *state = ConnectionState::Initializing;
        }

        let result = InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: self.server.capabilities.clone(),
            server_info: self.server.server_info.clone(),
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        info!(
            "Client initialized: {} {}",
            params.client_info.name, params.client_info.version
        );
        Ok(serde_json::to_value(result)?)
    }

    /// Handle list tools request
    #[inline]
    pub async fn handle_list_tools(&self) -> Result<Value> {
        let tools = self.server.tools.read().await;
        let result = ListToolsResult {
            tools: tools.values().cloned().collect(),
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request.
    ///
    /// Arguments that violate the tool's schema and failures inside the tool
    /// are reported as error results, not JSON-RPC errors.
    #[inline]
    pub async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params: CallToolParams = self.params("tools/call", params)?;

        let handlers = self.server.tool_handlers.read().await;
        let registered = handlers
            .get(&params.name)
            .ok_or_else(|| McpError::ToolNotFound {
                name: params.name.clone(),
            })?;

        let violations = schema_violations(&registered.arguments, &params.arguments_value());
        let result = if violations.is_empty() {
            let tool_name = params.name.clone();
            registered.handler.handle(params).await.unwrap_or_else(|e| {
                error!("Tool {} failed: {:#}", tool_name, e);
                CallToolResult::error(format!("Error: {:#}", e))
            })
        } else {
            warn!("Rejected arguments for {}: {:?}", params.name, violations);
            CallToolResult::error(format!(
                "Error: Invalid arguments for {}: {}",
                params.name,
                violations.join("; ")
            ))
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle `logging/setLevel`
    #[inline]
    pub async fn handle_set_level(&self, params: Option<Value>) -> Result<Value> {
        let params: SetLevelParams = self.params("logging/setLevel", params)?;
        {
            let mut level = self.server.log_level.write().await;
            *level = params.level;
        }
        info!("Client log level set to {:?}", params.level);
        Ok(json!({}))
    }
}
