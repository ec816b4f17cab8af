//! Tool server: JSON-RPC 2.0 over a line-delimited stream (stdin/stdout in
//! production). One request per line, one response per line, each request
//! handled to completion before the next line is read.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::errors::AgentError;
use crate::state::AppState;
use crate::tools::{call_tool, tool_definitions};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;

pub struct ToolServer {
    state: AppState,
}

impl ToolServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Serves until `reader` reaches end of input.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Tool server ready (protocol {})", PROTOCOL_VERSION);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            // Bytes that are not UTF-8 get a parse error, not a dead server.
            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line.trim_end()).await,
                Err(e) => {
                    warn!("Request is not valid UTF-8: {e}");
                    Some(parse_error(&e))
                }
            };
            if let Some(response) = response {
                let mut out = response.to_string();
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        info!("Input closed, shutting down");
        Ok(())
    }

    /// Handles one raw line. `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let request: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable request: {e}");
                return Some(parse_error(&e));
            }
        };

        let id = request.get("id").cloned();
        let Some(method) = request.get("method").and_then(Value::as_str) else {
            return Some(error_response(
                id.unwrap_or(Value::Null),
                json!({ "code": INVALID_REQUEST, "message": "Invalid request: missing method" }),
            ));
        };

        let Some(id) = id else {
            debug!("Notification: {}", method);
            return None;
        };

        let params = request.get("params").cloned().unwrap_or(Value::Null);
        Some(match self.dispatch(method, params).await {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(error) => error_response(id, error),
        })
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, Value> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => {
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AgentError::Protocol("tools/call requires a tool name".to_string())
                            .to_rpc_error(None)
                    })?;
                let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
                call_tool(&self.state, name, arguments)
                    .await
                    .map_err(|e| e.to_rpc_error())
            }
            other => Err(json!({
                "code": METHOD_NOT_FOUND,
                "message": format!("Method not found: {other}"),
            })),
        }
    }
}

fn error_response(id: Value, error: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": error })
}

/// The request id is unknowable, so the response carries `id: null`.
fn parse_error(e: &dyn std::fmt::Display) -> Value {
    error_response(
        Value::Null,
        json!({ "code": PARSE_ERROR, "message": format!("Parse error: {e}") }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{portfolio_site, FakeLlm, FakeRunner};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn server() -> (TempDir, ToolServer) {
        let (site, config) = portfolio_site();
        let state = AppState {
            config,
            llm: Arc::new(FakeLlm::new()),
            runner: Arc::new(FakeRunner::new()),
        };
        (site, ToolServer::new(state))
    }

    #[tokio::test]
    async fn test_list_projects_call() {
        let (_site, server) = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"list_projects"}}"#)
            .await
            .unwrap();

        assert_eq!(response["id"], 7);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let body: Value = serde_json::from_str(text).unwrap();
        assert_eq!(body["projects"].as_array().unwrap().len(), 3);
        assert_eq!(body["projects"][0]["title"], "Trail Finder");
        assert_eq!(body["projects"][2]["title"], "Pixel Forge");
    }

    #[tokio::test]
    async fn test_unknown_tool_echoes_id() {
        let (_site, server) = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":"abc","method":"tools/call","params":{"name":"frobnicate","arguments":{}}}"#)
            .await
            .unwrap();

        assert_eq!(response["id"], "abc");
        assert_eq!(response["error"]["data"]["kind"], "ProtocolError");
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_gets_null_id() {
        let (_site, server) = server();
        let response = server.handle_line("{not json").await.unwrap();

        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_method_and_notifications() {
        let (_site, server) = server();

        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);

        let none = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_serve_answers_one_line_per_request() {
        let (_site, server) = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let mut output = Vec::new();

        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(lines[1]["result"]["tools"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_serve_survives_invalid_utf8() {
        let (_site, server) = server();
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\x80\"}\n".to_vec();
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\r\n");
        let mut output = Vec::new();

        server.serve(input.as_slice(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], Value::Null);
        assert_eq!(lines[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(lines[1]["id"], 2);
        assert_eq!(lines[1]["result"], json!({}));
    }
}
