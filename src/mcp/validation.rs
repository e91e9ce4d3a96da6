//! MCP Message Validation
//!
//! JSON schema validation for incoming JSON-RPC messages and for tool
//! arguments against each tool's declared input schema.

use crate::mcp::protocol::*;
use anyhow::{Result, anyhow};
use jsonschema::Validator;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::debug;

/// Compile a schema with the draft the tool definitions are written in
#[inline]
pub fn compile_schema(schema: &Value) -> Result<Validator> {
    jsonschema::draft7::new(schema).map_err(|e| anyhow!("Invalid JSON schema: {}", e))
}

/// Every violation of `schema` by `value`, empty if it conforms
#[inline]
pub fn schema_violations(schema: &Validator, value: &Value) -> Vec<String> {
    schema.iter_errors(value).map(|e| e.to_string()).collect()
}

/// JSON Schema validator for MCP messages
pub struct McpValidator {
    schemas: HashMap<&'static str, Validator>,
}

impl std::fmt::Debug for McpValidator {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpValidator")
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl McpValidator {
    #[inline]
    pub fn new() -> Result<Self> {
        let mut validator = Self {
            schemas: HashMap::new(),
        };
        validator.load_builtin_schemas()?;
        Ok(validator)
    }

    fn load_builtin_schemas(&mut self) -> Result<()> {
        let id_schema = json!({
            "oneOf": [
                {"type": "string"},
                {"type": "integer"}
            ]
        });

        self.add_schema(
            "jsonrpc_request",
            &json!({
                "type": "object",
                "properties": {
                    "jsonrpc": {"type": "string", "const": "2.0"},
                    "method": {"type": "string"},
                    "params": {"type": "object"},
                    "id": id_schema
                },
                "required": ["jsonrpc", "method", "id"]
            }),
        )?;

        self.add_schema(
            "jsonrpc_response",
            &json!({
                "type": "object",
                "properties": {
                    "jsonrpc": {"type": "string", "const": "2.0"},
                    "result": {},
                    "id": id_schema
                },
                "required": ["jsonrpc", "result", "id"]
            }),
        )?;

        self.add_schema(
            "jsonrpc_error_response",
            &json!({
                "type": "object",
                "properties": {
                    "jsonrpc": {"type": "string", "const": "2.0"},
                    "error": {
                        "type": "object",
                        "properties": {
                            "code": {"type": "integer"},
                            "message": {"type": "string"},
                            "data": {}
                        },
                        "required": ["code", "message"]
                    },
                    "id": {
                        "oneOf": [
                            {"type": "string"},
                            {"type": "integer"},
                            {"type": "null"}
                        ]
                    }
                },
                "required": ["jsonrpc", "error", "id"]
            }),
        )?;

        self.add_schema(
            "jsonrpc_notification",
            &json!({
                "type": "object",
                "properties": {
                    "jsonrpc": {"type": "string", "const": "2.0"},
                    "method": {"type": "string"},
                    "params": {"type": "object"}
                },
                "required": ["jsonrpc", "method"]
            }),
        )?;

        self.add_schema(
            "initialize_params",
            &json!({
                "type": "object",
                "properties": {
                    "protocolVersion": {"type": "string"},
                    "capabilities": {"type": "object"},
                    "clientInfo": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "version": {"type": "string"}
                        },
                        "required": ["name", "version"]
                    }
                },
                "required": ["protocolVersion", "clientInfo"]
            }),
        )?;

        self.add_schema(
            "call_tool_params",
            &json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "arguments": {"type": ["object", "null"]}
                },
                "required": ["name"]
            }),
        )?;

        self.add_schema(
            "set_level_params",
            &json!({
                "type": "object",
                "properties": {
                    "level": {
                        "enum": [
                            "debug", "info", "notice", "warning",
                            "error", "critical", "alert", "emergency"
                        ]
                    }
                },
                "required": ["level"]
            }),
        )?;

        debug!("Loaded {} built-in JSON schemas", self.schemas.len());
        Ok(())
    }

    fn add_schema(&mut self, name: &'static str, schema: &Value) -> Result<()> {
        let compiled = compile_schema(schema)
            .map_err(|e| anyhow!("Failed to compile schema '{}': {}", name, e))?;
        self.schemas.insert(name, compiled);
        Ok(())
    }

    /// Validate a value against a named schema
    #[inline]
    pub fn validate_with_schema(&self, schema_name: &str, value: &Value) -> Result<()> {
        let schema = self
            .schemas
            .get(schema_name)
            .ok_or_else(|| anyhow!("Schema '{}' not found", schema_name))?;

        let violations = schema_violations(schema, value);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "Schema validation failed for '{}': {}",
                schema_name,
                violations.join(", ")
            ))
        }
    }

    /// Validate the params of a known method; unknown methods pass through
    #[inline]
    pub fn validate_params(&self, method: &str, params: &Value) -> Result<()> {
        let schema_name = match method {
            "initialize" => "initialize_params",
            "tools/call" => "call_tool_params",
            "logging/setLevel" => "set_level_params",
            _ => {
                debug!("No parameter validation schema for method: {}", method);
                return Ok(());
            }
        };

        self.validate_with_schema(schema_name, params)
    }

    /// Validate a raw JSON value and classify it as a JSON-RPC message.
    ///
    /// Only the envelope is checked here; method params are checked by
    /// [`McpValidator::validate_params`] once the request is dispatched.
    #[inline]
    pub fn validate_raw_message(&self, value: &Value) -> Result<JsonRpcMessage> {
        let has = |key: &str| value.get(key).is_some();

        if has("method") && has("id") {
            self.validate_with_schema("jsonrpc_request", value)?;
            return Ok(JsonRpcMessage::Request(serde_json::from_value(
                value.clone(),
            )?));
        }

        if has("method") {
            self.validate_with_schema("jsonrpc_notification", value)?;
            return Ok(JsonRpcMessage::Notification(serde_json::from_value(
                value.clone(),
            )?));
        }

        if has("error") {
            self.validate_with_schema("jsonrpc_error_response", value)?;
            return Ok(JsonRpcMessage::ErrorResponse(serde_json::from_value(
                value.clone(),
            )?));
        }

        if has("result") {
            self.validate_with_schema("jsonrpc_response", value)?;
            return Ok(JsonRpcMessage::Response(serde_json::from_value(
                value.clone(),
            )?));
        }

        Err(anyhow!(
            "Value does not match any known JSON-RPC message type"
        ))
    }
}

/// Request id of a message that failed validation, if one can be recovered
#[inline]
pub fn recover_request_id(value: &Value) -> Option<RequestId> {
    value
        .get("id")
        .and_then(|id| serde_json::from_value(id.clone()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_creation() {
        let validator = McpValidator::new().expect("validator is ok");
        assert_eq!(validator.schemas.len(), 7);
    }

    #[test]
    fn request_classification() {
        let validator = McpValidator::new().expect("validator is ok");

        let message = validator
            .validate_raw_message(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/list"
            }))
            .expect("request is valid");
        assert!(matches!(message, JsonRpcMessage::Request(_)));

        let message = validator
            .validate_raw_message(&json!({
                "jsonrpc": "2.0",
                "method": "notifications/initialized"
            }))
            .expect("notification is valid");
        assert!(matches!(message, JsonRpcMessage::Notification(_)));
    }

    #[test]
    fn wrong_jsonrpc_version_is_rejected() {
        let validator = McpValidator::new().expect("validator is ok");
        let result = validator.validate_raw_message(&json!({
            "jsonrpc": "1.0",
            "id": 1,
            "method": "ping"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn initialize_params_validation() {
        let validator = McpValidator::new().expect("validator is ok");

        let params = json!({
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        });
        assert!(
            validator
                .validate_with_schema("initialize_params", &params)
                .is_ok()
        );

        let invalid_params = json!({
            "protocolVersion": "2025-06-18"
        });
        assert!(
            validator
                .validate_with_schema("initialize_params", &invalid_params)
                .is_err()
        );
    }

    #[test]
    fn tool_argument_violations() {
        let schema = compile_schema(&json!({
            "type": "object",
            "properties": {
                "source_files": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["source_files"]
        }))
        .expect("schema compiles");

        assert!(schema_violations(&schema, &json!({"source_files": ["A.java"]})).is_empty());
        assert_eq!(schema_violations(&schema, &json!({})).len(), 1);
        assert_eq!(
            schema_violations(&schema, &json!({"source_files": [1, 2]})).len(),
            2
        );
    }

    #[test]
    fn request_id_recovery() {
        assert_eq!(
            recover_request_id(&json!({"id": "abc", "method": 5})),
            Some(RequestId::String("abc".to_string()))
        );
        assert_eq!(recover_request_id(&json!({"id": [1]})), None);
        assert_eq!(recover_request_id(&json!({})), None);
    }
}
