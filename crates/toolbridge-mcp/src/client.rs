//! Client for remote MCP tool servers that reply over a text event stream.
//!
//! A call runs through compose, transmit, receive, frame extraction, JSON
//! decode and result extraction. Any failure along the way becomes a failed
//! [`ResponseEnvelope`]; [`McpClient::call_tool`] never returns an error.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Map, Value};
use toolbridge_core::{Error, Locale, McpConfig, Message, ResponseEnvelope, Result};
use tracing::{debug, error, info, warn};

use crate::protocol::{JsonRpcRequest, RemoteReply, RequestId, ToolDefinition, ToolsListResult};
use crate::stream::first_frame;

/// Text a remote tool embeds in its output to report failure.
pub const ERROR_MARKER: &str = "❌ Error";

/// Diagnostic for failures the remote tool reported itself.
const TOOL_ERROR: &str = "tool_error: remote tool reported an error";

/// Accept header; the server may answer with plain JSON or an event stream.
const ACCEPT: &str = "application/json, text/event-stream";

/// Longest prefix of a raw body written to the debug log.
const LOG_PREVIEW_CHARS: usize = 200;

/// What a successful `tools/call` carried back.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// `result.content[0].text`, with the result's `isError` flag
    Text { text: String, is_error: bool },
    /// Any other `result` shape, forwarded as-is
    Structured(Value),
}

impl ToolOutcome {
    /// Whether the tool itself reported a failure inside its output.
    ///
    /// Checked only after transport and protocol have succeeded.
    pub fn reports_error(&self) -> bool {
        match self {
            ToolOutcome::Text { text, is_error } => *is_error || text.contains(ERROR_MARKER),
            ToolOutcome::Structured(result) => {
                result.get("isError").and_then(Value::as_bool) == Some(true)
            }
        }
    }

    fn into_envelope(self, locale: Locale) -> ResponseEnvelope {
        let domain_error = self.reports_error();

        match (self, domain_error) {
            (ToolOutcome::Text { text, .. }, true) => {
                ResponseEnvelope::failure(text).with_error(TOOL_ERROR)
            }
            (ToolOutcome::Text { text, .. }, false) => {
                ResponseEnvelope::ok(text.clone(), Value::String(text))
            }
            (ToolOutcome::Structured(result), true) => {
                let message = Message::RemoteToolFailed(result.to_string()).render(locale);
                ResponseEnvelope::failure(message).with_error(TOOL_ERROR)
            }
            (ToolOutcome::Structured(result), false) => {
                ResponseEnvelope::ok(Message::ToolExecuted.render(locale), result)
            }
        }
    }
}

/// MCP client for a single remote server.
pub struct McpClient {
    url: String,
    locale: Locale,
    next_id: AtomicI64,
    client: reqwest::Client,
}

impl McpClient {
    /// Create a client for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();

        Self {
            url: url.into(),
            locale: Locale::default(),
            next_id: AtomicI64::new(seed),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the shared configuration.
    pub fn from_config(config: &McpConfig, locale: Locale) -> Self {
        Self::new(config.url.clone()).with_locale(locale)
    }

    /// Set the language of failure messages.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Call a remote tool. Always produces an envelope.
    pub async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ResponseEnvelope {
        info!(tool = name, "Calling remote MCP tool");

        match self.try_call_tool(name, arguments).await {
            Ok(outcome) => outcome.into_envelope(self.locale),
            Err(e) => {
                error!(tool = name, error = %e, "Remote MCP tool call failed");
                ResponseEnvelope::from_error(&e, self.locale, Message::RemoteToolFailed)
            }
        }
    }

    /// Call a remote tool, stopping at the protocol layer.
    pub async fn try_call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutcome> {
        let result = self
            .rpc("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        Ok(extract_outcome(result))
    }

    /// List the tools the remote server declares.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        let result = self.rpc("tools/list", json!({})).await?;
        let list: ToolsListResult = serde_json::from_value(result)?;

        debug!(
            count = list.tools.len(),
            tools = ?list.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "Remote MCP tools listed"
        );
        Ok(list.tools)
    }

    /// Send one JSON-RPC request and return its `result`.
    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(RequestId::Number(id), method, params);
        debug!(url = self.url, method = method, id = id, "MCP POST request");

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "MCP server error response");
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        debug!(body = preview(&body), "MCP raw response");
        decode_result(&body)
    }
}

/// Pull the JSON-RPC `result` out of a raw stream body.
pub fn decode_result(body: &str) -> Result<Value> {
    let frame = first_frame(body)
        .ok_or_else(|| Error::MalformedStream("no `data:` frame in response body".to_string()))?;

    debug!(event = ?frame.event, "MCP frame extracted");

    let reply: RemoteReply = serde_json::from_str(frame.data)?;

    match (reply.result, reply.error) {
        (Some(result), _) => Ok(result),
        (None, Some(err)) => Err(Error::Protocol(format!(
            "remote error {}: {}",
            err.code, err.message
        ))),
        (None, None) => Err(Error::Protocol("response has no `result`".to_string())),
    }
}

/// Classify a `tools/call` result by shape.
pub fn extract_outcome(result: Value) -> ToolOutcome {
    let text = result
        .get("content")
        .and_then(|content| content.get(0))
        .and_then(|first| first.get("text"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty());

    match text {
        Some(text) => ToolOutcome::Text {
            text: text.to_string(),
            is_error: result.get("isError").and_then(Value::as_bool) == Some(true),
        },
        None => ToolOutcome::Structured(result),
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
