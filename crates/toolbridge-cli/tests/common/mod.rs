//! Shared setup for end-to-end dispatcher tests.
//!
//! Every backend is served by one `httpmock::MockServer`: Redmine at the
//! root, GitLab under `/api/v4`, the remote MCP server at `/api/mcp`.

#![allow(dead_code)]

use httpmock::MockServer;
use serde_json::Value;
use toolbridge_core::{BridgeConfig, Locale, ResponseEnvelope};
use toolbridge_mcp::Dispatcher;

pub const MCP_PATH: &str = "/api/mcp";
pub const REDMINE_KEY: &str = "redmine-test-key";
pub const GITLAB_TOKEN: &str = "glpat-test-token";

/// Builder for a configuration pointing at a mock server.
pub struct TestConfig {
    config: BridgeConfig,
}

impl TestConfig {
    /// Every service configured against `server`.
    pub fn for_server(server: &MockServer) -> Self {
        let lookup = |key: &str| match key {
            "REDMINE_URL" => Some(server.base_url()),
            "REDMINE_API_KEY" => Some(REDMINE_KEY.to_string()),
            "REDMINE_DEFAULT_PROJECT_ID" => Some("5".to_string()),
            "GITLAB_URL" => Some(server.base_url()),
            "GITLAB_TOKEN" => Some(GITLAB_TOKEN.to_string()),
            "MCP_SERVER_URL" => Some(server.url(MCP_PATH)),
            _ => None,
        };

        Self {
            config: BridgeConfig::default().apply_env_with(lookup),
        }
    }

    /// No credentials, and every URL unroutable.
    pub fn offline() -> Self {
        let mut config = BridgeConfig::default();
        config.gitlab.url = "http://127.0.0.1:9".to_string();
        config.mcp.url = format!("http://127.0.0.1:9{}", MCP_PATH);
        Self { config }
    }

    pub fn without_redmine_key(mut self) -> Self {
        self.config.redmine.api_key = None;
        self
    }

    pub fn without_gitlab_token(mut self) -> Self {
        self.config.gitlab.token = None;
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn dispatcher(self) -> Dispatcher {
        Dispatcher::new(&self.config)
    }
}

/// Execute one tool call against a fresh dispatcher.
pub async fn call(config: TestConfig, tool: &str, arguments: Value) -> ResponseEnvelope {
    config.dispatcher().execute(tool, Some(arguments)).await
}

/// Wrap a JSON-RPC result the way the remote server streams it.
pub fn sse_body(result: Value) -> String {
    format!(
        "event: message\ndata: {}\n\n",
        serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": result})
    )
}

/// Check the envelope invariants every tool call must satisfy.
pub fn assert_well_formed(envelope: &ResponseEnvelope) {
    assert!(
        !envelope.message.trim().is_empty(),
        "message must never be empty: {:?}",
        envelope
    );
    if !envelope.success {
        assert!(envelope.data.is_none(), "failed envelope carries data: {:?}", envelope);
    }
}
