//! JSON-RPC 2.0 stdio front end implementing the MCP tool protocol.
//!
//! Handles `initialize`, `ping`, `tools/list`, and `tools/call`. One request
//! per line on stdin, one response per line on stdout; logs go to stderr so
//! the protocol stream stays clean.

use crate::core::domain::error::{BridgeError, BridgeResult};
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC error code for a taxonomy error. Validation failures are invalid
/// params; everything else is a server-defined error.
fn error_code(err: &BridgeError) -> i64 {
    match err {
        BridgeError::Validation { .. } => -32602,
        BridgeError::NotFound(_) => -32001,
        BridgeError::Conflict(_) => -32002,
        BridgeError::Auth(_) => -32003,
        BridgeError::Timeout(_) => -32004,
        BridgeError::Upstream { .. } => -32000,
    }
}

pub struct McpServer {
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Serves requests from stdin until EOF.
    pub async fn run(&self) -> std::io::Result<()> {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();

        while let Some(line) = lines.next_line().await? {
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(input) {
                Ok(req) => req,
                Err(err) => {
                    tracing::warn!(%err, "unparseable JSON-RPC request");
                    continue;
                }
            };

            let id = request.id.clone();
            let is_notification = id.is_none();
            let outcome = self.handle_request(&request).await;

            if is_notification {
                if let Err(err) = outcome {
                    tracing::warn!(method = %request.method, %err, "notification failed");
                }
                continue;
            }

            let response = match outcome {
                Ok(result) => JsonRpcResponse {
                    jsonrpc: "2.0",
                    id,
                    result: Some(result),
                    error: None,
                },
                Err(err) => JsonRpcResponse {
                    jsonrpc: "2.0",
                    id,
                    result: None,
                    error: Some(JsonRpcError {
                        code: error_code(&err),
                        message: err.to_string(),
                    }),
                },
            };

            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer(&mut stdout, &response)?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
        }
        Ok(())
    }

    pub async fn handle_request(&self, request: &JsonRpcRequest) -> BridgeResult<Value> {
        match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
                "capabilities": {"tools": {}}
            })),
            "notifications/initialized" => Ok(Value::Null),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({"tools": self.registry.tools()})),
            "tools/call" => {
                let params = request
                    .params
                    .as_ref()
                    .ok_or_else(|| BridgeError::validation("params", "missing for tools/call"))?;
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| BridgeError::validation("name", "missing tool name"))?;
                let default_args = json!({});
                let args = params.get("arguments").unwrap_or(&default_args);
                let text = self.registry.call(name, args).await?;
                Ok(json!({
                    "content": [{"type": "text", "text": text}]
                }))
            }
            other => Err(BridgeError::NotFound(format!("method '{other}'"))),
        }
    }
}
