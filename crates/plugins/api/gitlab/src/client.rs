//! GitLab API client implementation.

use serde_json::{json, Value};
use toolbridge_core::{Error, GitLabConfig, MergeRequestState, Result};
use tracing::{debug, warn};

use crate::DEFAULT_GITLAB_URL;

/// GitLab API client.
///
/// The token is checked on every call rather than at construction, so a
/// client can exist without credentials and still fail cleanly before any
/// request leaves the process.
pub struct GitLabClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GitLabClient {
    /// Create a new GitLab client against gitlab.com.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_GITLAB_URL, Some(token.into()))
    }

    /// Create a new GitLab client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the shared configuration.
    pub fn from_config(config: &GitLabConfig) -> Self {
        Self::with_base_url(config.url.clone(), config.token.clone())
    }

    fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| Error::MissingConfig {
            service: "GitLab",
            keys: vec!["GITLAB_TOKEN"],
        })
    }

    /// Build request with common headers.
    fn request(&self, method: reqwest::Method, url: &str) -> Result<reqwest::RequestBuilder> {
        let token = self.token()?;
        Ok(self
            .client
            .request(method, url)
            .header("PRIVATE-TOKEN", token))
    }

    /// Get the merge request API URL for a project.
    fn merge_requests_url(&self, project: &str, endpoint: &str) -> String {
        format!(
            "{}/api/v4/projects/{}/merge_requests{}",
            self.base_url,
            encode_project(project),
            endpoint
        )
    }

    /// Make an authenticated GET request.
    async fn get(&self, url: &str) -> Result<Value> {
        let request = self.request(reqwest::Method::GET, url)?;
        debug!(url = url, "GitLab GET request");

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make an authenticated POST request, with or without a JSON body.
    async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self.request(reqwest::Method::POST, url)?;
        debug!(url = url, "GitLab POST request");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle response and map errors.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "GitLab API error response"
            );
            return Err(Error::Api {
                status: status_code,
                message,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// List merge requests of a project in the given state.
    pub async fn list_merge_requests(
        &self,
        project: &str,
        state: MergeRequestState,
    ) -> Result<Vec<Value>> {
        let url = format!(
            "{}?state={}",
            self.merge_requests_url(project, ""),
            state.as_str()
        );
        expect_array(self.get(&url).await?)
    }

    /// Get merge request changes with diffs.
    pub async fn get_merge_request_changes(&self, project: &str, mr_iid: u64) -> Result<Value> {
        let url = self.merge_requests_url(project, &format!("/{}/changes", mr_iid));
        self.get(&url).await
    }

    /// Get merge request notes.
    pub async fn get_merge_request_notes(&self, project: &str, mr_iid: u64) -> Result<Vec<Value>> {
        let url = self.merge_requests_url(project, &format!("/{}/notes", mr_iid));
        expect_array(self.get(&url).await?)
    }

    /// Get merge request commits.
    pub async fn get_merge_request_commits(
        &self,
        project: &str,
        mr_iid: u64,
    ) -> Result<Vec<Value>> {
        let url = self.merge_requests_url(project, &format!("/{}/commits", mr_iid));
        expect_array(self.get(&url).await?)
    }

    /// Post a general comment to a merge request.
    pub async fn post_merge_request_note(
        &self,
        project: &str,
        mr_iid: u64,
        body: &str,
    ) -> Result<Value> {
        require_body(body)?;
        let url = self.merge_requests_url(project, &format!("/{}/notes", mr_iid));
        self.post(&url, Some(&json!({ "body": body }))).await
    }

    /// Start a discussion anchored to a diff position.
    ///
    /// `position` goes to GitLab as given; GitLab decides whether it is valid.
    pub async fn post_merge_request_inline_comment(
        &self,
        project: &str,
        mr_iid: u64,
        body: &str,
        position: &Value,
    ) -> Result<Value> {
        require_body(body)?;
        let url = self.merge_requests_url(project, &format!("/{}/discussions", mr_iid));
        self.post(&url, Some(&json!({ "body": body, "position": position })))
            .await
    }

    /// Approve a merge request.
    pub async fn approve_merge_request(&self, project: &str, mr_iid: u64) -> Result<Value> {
        let url = self.merge_requests_url(project, &format!("/{}/approve", mr_iid));
        self.post(&url, None).await
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Percent-encode a project reference for use as a single path segment.
///
/// `group/project` becomes `group%2Fproject`; numeric ids are unchanged.
pub fn encode_project(project: &str) -> String {
    urlencoding::encode(project).into_owned()
}

fn require_body(body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(Error::InvalidInput("comment body must not be empty".to_string()));
    }
    Ok(())
}

fn expect_array(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::Protocol(format!(
            "expected a JSON array from GitLab, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
