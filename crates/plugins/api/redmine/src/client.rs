//! Redmine API client implementation.

use toolbridge_core::{CreateIssueArgs, Error, RedmineConfig, Result};
use tracing::{debug, info, warn};

use crate::types::{
    CreateIssuePayload, CreateIssueResponse, NewIssue, Priority, RemoteIssue, Tracker,
};

/// Redmine API client.
pub struct RedmineClient {
    config: RedmineConfig,
    client: reqwest::Client,
}

/// Settings resolved from a complete configuration.
struct Settings<'a> {
    base_url: &'a str,
    api_key: &'a str,
    project_id: u64,
}

impl RedmineClient {
    /// Create a client from the shared configuration.
    ///
    /// Missing settings are reported when an issue is created, not here.
    pub fn new(config: RedmineConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn settings(&self) -> Result<Settings<'_>> {
        let missing = self.config.missing_keys();
        let (Some(base_url), Some(api_key), Some(project_id)) = (
            self.config.url.as_deref(),
            self.config.api_key.as_deref(),
            self.config.project_id.as_deref(),
        ) else {
            warn!(missing = ?missing, "Redmine configuration incomplete");
            return Err(Error::MissingConfig {
                service: "Redmine",
                keys: missing,
            });
        };

        let project_id = project_id.parse::<u64>().map_err(|_| {
            Error::Config(format!(
                "REDMINE_DEFAULT_PROJECT_ID must be a numeric id, got '{}'",
                project_id
            ))
        })?;

        Ok(Settings {
            base_url: base_url.trim_end_matches('/'),
            api_key,
            project_id,
        })
    }

    /// Create an issue in the configured default project.
    pub async fn create_issue(&self, args: &CreateIssueArgs) -> Result<RemoteIssue> {
        let settings = self.settings()?;

        if args.subject.trim().is_empty() {
            return Err(Error::InvalidInput("issue subject must not be empty".to_string()));
        }

        let payload = build_payload(args, settings.project_id);
        let url = format!("{}/issues.json", settings.base_url);
        debug!(url = url, subject = args.subject, "Redmine POST request");

        let response = self
            .client
            .post(&url)
            .header("X-Redmine-API-Key", settings.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Redmine API error response"
            );
            return Err(Error::Api {
                status: status_code,
                message,
            });
        }

        let created: CreateIssueResponse = response
            .json()
            .await
            .map_err(|e| Error::Protocol(format!("Failed to parse Redmine response: {}", e)))?;

        let id = created
            .issue
            .and_then(|issue| issue.id)
            .ok_or_else(|| Error::Protocol("Redmine response has no issue.id".to_string()))?;

        info!(id = id, "Redmine issue created");

        Ok(RemoteIssue {
            id,
            url: format!("{}/issues/{}", settings.base_url, id),
            subject: args.subject.clone(),
            priority: Priority::from_id(args.priority_id),
            tracker: Tracker::from_id(args.tracker_id),
        })
    }
}

/// Build the request body for a new issue.
pub(crate) fn build_payload(args: &CreateIssueArgs, project_id: u64) -> CreateIssuePayload {
    CreateIssuePayload {
        issue: NewIssue {
            project_id,
            subject: args.subject.clone(),
            tracker_id: args.tracker_id,
            priority_id: args.priority_id,
            description: args.description.clone().filter(|d| !d.is_empty()),
            estimated_hours: args.estimated_hours,
        },
    }
}
