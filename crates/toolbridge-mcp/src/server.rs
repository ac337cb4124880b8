//! Stdio MCP server exposing the dispatcher.
//!
//! Lifecycle:
//! 1. `initialize` - exchange capabilities
//! 2. `tools/list` / `tools/call` - publish and run the dispatcher's tools
//! 3. EOF on stdin - shut down

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};
use toolbridge_core::Result;

use crate::handlers::Dispatcher;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolCallResult, ToolsCapability,
    ToolsListResult, MCP_VERSION,
};
use crate::transport::{IncomingMessage, StdioTransport, Transport};

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "toolbridge";

/// MCP server for toolbridge.
pub struct McpServer {
    dispatcher: Dispatcher,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            initialized: false,
        }
    }

    /// Run the server on stdin/stdout until EOF.
    pub async fn run(&mut self) -> Result<()> {
        self.serve(&mut StdioTransport::stdio()).await
    }

    /// Run the server main loop on any transport.
    pub async fn serve<R, W>(&mut self, transport: &mut Transport<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!("Starting MCP server");

        loop {
            match transport.read_message().await {
                Ok(Some(msg)) => {
                    if let Some(resp) = self.handle_message(msg).await {
                        if let Err(e) = transport.write_response(&resp).await {
                            tracing::error!("Failed to write response: {}", e);
                            break;
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::error!("Transport error: {}", e);
                    let error_resp = JsonRpcResponse::error(
                        RequestId::Null,
                        JsonRpcError::parse_error(&e.to_string()),
                    );
                    if let Err(e) = transport.write_response(&error_resp).await {
                        tracing::error!("Failed to write response: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Transport error: {}", e);
                    break;
                }
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle an incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
        }
    }

    /// Handle a JSON-RPC request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!("Handling request: {} (id: {:?})", req.method, req.id);

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
            method => {
                tracing::warn!("Unknown method: {}", method);
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    /// Handle notifications (no response).
    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                tracing::info!("Client initialized");
            }
            "notifications/cancelled" => {
                tracing::debug!("Request cancelled by client");
            }
            _ => {
                tracing::debug!("Ignoring notification: {}", method);
            }
        }
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init) => tracing::info!(
                    "Client: {} v{} (protocol: {})",
                    init.client_info.name,
                    init.client_info.version,
                    init.protocol_version
                ),
                Err(e) => tracing::warn!("Failed to parse initialize params: {}", e),
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        respond(id, &result)
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.dispatcher.tool_definitions(),
        };
        respond(id, &result)
    }

    /// Run a tool; the envelope goes back as JSON text.
    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params(&e.to_string()));
            }
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        tracing::info!("Calling tool: {}", params.name);

        let envelope = self.dispatcher.execute(&params.name, params.arguments).await;
        let text = match serde_json::to_string_pretty(&envelope) {
            Ok(text) => text,
            Err(e) => {
                return JsonRpcResponse::error(id, JsonRpcError::internal_error(&e.to_string()));
            }
        };

        respond(id, &ToolCallResult::text(text, !envelope.success))
    }
}

/// Serialize a result into a success response.
fn respond<T: Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(&e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ToolResultContent, JSONRPC_VERSION};
    use serde_json::json;
    use toolbridge_core::{BridgeConfig, ResponseEnvelope};

    fn server() -> McpServer {
        McpServer::new(Dispatcher::new(&BridgeConfig::default()))
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(id),
            method: method.to_string(),
            params,
        }
    }

    fn envelope_of(resp: JsonRpcResponse) -> (ResponseEnvelope, Option<bool>) {
        let result: ToolCallResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        let ToolResultContent::Text { text } = &result.content[0];
        (serde_json::from_str(text).unwrap(), result.is_error)
    }

    #[tokio::test]
    async fn test_initialize() {
        let mut server = server();
        let resp = server
            .handle_request(request(
                1,
                "initialize",
                Some(json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0.0"}
                })),
            ))
            .await;

        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "toolbridge");
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert!(server.initialized);
    }

    #[test]
    fn test_double_initialize_error() {
        let mut server = server();
        server.initialized = true;

        let resp = server.handle_initialize(RequestId::Number(1), None);
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_initialize_with_invalid_params() {
        let mut server = server();
        let resp =
            server.handle_initialize(RequestId::Number(1), Some(json!({"invalid": true})));

        assert!(resp.result.is_some());
        assert!(server.initialized);
    }

    #[test]
    fn test_tools_list() {
        let resp = server().handle_tools_list(RequestId::Number(1));
        let result: ToolsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();

        assert_eq!(result.tools.len(), 10);
        assert!(result.tools.iter().any(|t| t.name == "control_light"));
        assert!(result
            .tools
            .iter()
            .any(|t| t.name == "gitlab_approve_merge_request"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let resp = server()
            .handle_request(request(1, "resources/list", None))
            .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let resp = server()
            .handle_request(request(
                7,
                "tools/call",
                Some(json!({
                    "name": "control_light",
                    "arguments": {"action": "on", "brightness": 55}
                })),
            ))
            .await;

        assert_eq!(resp.id, RequestId::Number(7));
        let (envelope, is_error) = envelope_of(resp);
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap()["brightness"], 55);
        assert!(is_error.is_none());
    }

    #[tokio::test]
    async fn test_tools_call_failure_sets_is_error() {
        let resp = server()
            .handle_request(request(
                2,
                "tools/call",
                Some(json!({"name": "control_light", "arguments": {"action": "dim"}})),
            ))
            .await;

        let (envelope, is_error) = envelope_of(resp);
        assert!(!envelope.success);
        assert_eq!(is_error, Some(true));
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let resp = server().handle_request(request(1, "tools/call", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_invalid_params() {
        let resp = server()
            .handle_request(request(1, "tools/call", Some(json!("not an object"))))
            .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let mut server = server();
        let msg = IncomingMessage::Notification(crate::protocol::JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: "notifications/initialized".to_string(),
            params: None,
        });

        assert!(server.handle_message(msg).await.is_none());
    }

    #[tokio::test]
    async fn test_serve_session() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{\"protocolVersion\":\"2024-11-05\",\"capabilities\":{},\"clientInfo\":{\"name\":\"t\",\"version\":\"0\"}}}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "garbage\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
        );
        let mut transport = Transport::new(input.as_bytes(), Vec::new());

        server().serve(&mut transport).await.unwrap();

        let output = String::from_utf8(transport.into_writer()).unwrap();
        let responses: Vec<JsonRpcResponse> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, RequestId::Number(1));
        assert!(responses[0].result.is_some());
        assert_eq!(responses[1].id, RequestId::Null);
        assert_eq!(
            responses[1].error.as_ref().unwrap().code,
            JsonRpcError::PARSE_ERROR
        );
        assert_eq!(responses[2].id, RequestId::Number(2));
    }
}
