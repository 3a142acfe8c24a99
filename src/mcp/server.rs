//! stdio 上的 MCP 服务
//!
//! 每行一个 JSON-RPC 请求，每个响应写成一行。通知（无 id）不回复。
//! stdout 专用于协议，日志由调用方配置到 stderr。

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::mcp::types::*;
use crate::tools::{failure_reason, ToolExecutor};

pub struct McpServer {
    executor: Arc<ToolExecutor>,
}

impl McpServer {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self { executor }
    }

    /// 处理一行输入；空行与通知返回 None
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    JsonRpcId::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };
        tracing::debug!("[MCP] Method: {}", request.method);

        let Some(id) = request.id.clone() else {
            tracing::debug!("[MCP] Notification {} acknowledged", request.method);
            return None;
        };
        Some(self.handle_request(id, request).await)
    }

    async fn handle_request(&self, id: JsonRpcId, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::error(id, INVALID_REQUEST, "jsonrpc must be \"2.0\"");
        }
        match request.method.as_str() {
            "initialize" => handle_initialize(id),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "ping" => JsonRpcResponse::success(id, json!({})),
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_tools_list(&self, id: JsonRpcId) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": self.executor.registry().definitions() }))
    }

    async fn handle_tools_call(&self, id: JsonRpcId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
                }
            },
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let args = params.arguments.unwrap_or_else(|| json!({}));
        tracing::info!("[MCP] Calling tool: {}", params.name);

        let result = match self.executor.execute(&params.name, args).await {
            Ok(output) => {
                let is_error = failure_reason(&output).is_some();
                let text = serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
                ToolCallResult::text(text, is_error)
            }
            Err(e) => {
                tracing::error!("[MCP] Tool execution error: {}", e);
                ToolCallResult::text(e.to_string(), true)
            }
        };
        JsonRpcResponse::from_serializable(id, &result)
    }

    /// 读取请求直到输入结束或 shutdown 被取消
    pub async fn serve<R, W>(&self, reader: R, mut writer: W, shutdown: CancellationToken) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("[MCP] Shutdown requested, stopping stdio loop");
                    break;
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                tracing::info!("[MCP] Input closed");
                break;
            };
            if let Some(response) = self.handle_line(&line).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }
}

fn handle_initialize(id: JsonRpcId) -> JsonRpcResponse {
    let result = InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
        },
    };
    JsonRpcResponse::from_serializable(id, &result)
}
