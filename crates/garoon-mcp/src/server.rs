//! Line-delimited JSON-RPC 2.0 over stdio.
//!
//! One request per line on stdin, one response per line on stdout.
//! Notifications get no response. Nothing else may write to stdout.

use garoon_client::GaroonClient;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::tools::{self, ToolError};
use crate::types::{
    error_codes, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolResult, JSONRPC_VERSION,
    PROTOCOL_VERSION, SERVER_NAME,
};

pub struct McpServer {
    client: GaroonClient,
}

impl McpServer {
    pub fn new(client: GaroonClient) -> Self {
        Self { client }
    }

    /// Serve until `reader` reaches EOF. A line that is not UTF-8 gets a
    /// parse error response; it does not end the session.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line.trim()).await,
                Err(e) => {
                    warn!(error = %e, "request is not valid UTF-8");
                    Some(JsonRpcResponse::failure(
                        Value::Null,
                        error_codes::PARSE_ERROR,
                        format!("Parse error: {e}"),
                    ))
                }
            };

            if let Some(response) = response {
                let mut encoded = serde_json::to_string(&response)?;
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Parse and dispatch one line of input.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                Some(JsonRpcResponse::failure(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "request");

        if request.is_notification() {
            // notifications/initialized, notifications/cancelled, ...
            debug!(method = %request.method, "notification ignored");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported jsonrpc version '{}'", request.jsonrpc),
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tools::definitions() })),
            "resources/list" => JsonRpcResponse::success(id, json!({ "resources": [] })),
            "prompts/list" => JsonRpcResponse::success(id, json!({ "prompts": [] })),
            "tools/call" => self.handle_tool_call(id, request.params).await,
            other => JsonRpcResponse::failure(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        };
        Some(response)
    }

    async fn handle_tool_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let parsed = params
            .map(serde_json::from_value::<ToolCallParams>)
            .transpose();
        let params = match parsed {
            Ok(Some(params)) => params,
            Ok(None) => {
                return JsonRpcResponse::failure(id, error_codes::INVALID_PARAMS, "Missing params");
            }
            Err(e) => {
                return JsonRpcResponse::failure(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                );
            }
        };

        let arguments = params.arguments.unwrap_or(Value::Null);
        let result = match tools::call_tool(&self.client, &params.name, arguments).await {
            Ok(text) => ToolResult::text(text),
            Err(err @ (ToolError::UnknownTool(_) | ToolError::InvalidArguments { .. })) => {
                warn!(tool = %params.name, error = %err, "rejected tool call");
                return JsonRpcResponse::failure(id, error_codes::INVALID_PARAMS, err.to_string());
            }
            Err(ToolError::Garoon(err)) => {
                error!(tool = %params.name, kind = err.kind(), error = %err, "tool failed");
                ToolResult::error(format!("{} error: {err}", err.kind()))
            }
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::failure(id, error_codes::INTERNAL_ERROR, e.to_string()),
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Serve on the process's stdin/stdout.
pub async fn run_stdio(server: &McpServer) -> std::io::Result<()> {
    info!("serving MCP over stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    server.run(stdin, stdout).await
}
