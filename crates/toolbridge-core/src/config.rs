//! Configuration management for toolbridge.
//!
//! Configuration is assembled once at startup and then shared read-only with
//! every adapter. Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a TOML file, by default `~/.config/toolbridge/config.toml`
//!    (`%APPDATA%\toolbridge\config.toml` on Windows)
//! 3. environment variables (`REDMINE_URL`, `GITLAB_TOKEN`, ...)
//!
//! # Example
//!
//! ```ignore
//! use toolbridge_core::config::BridgeConfig;
//!
//! let config = BridgeConfig::load()?.with_env();
//! assert!(config.gitlab.url.starts_with("https://"));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::locale::Locale;
use crate::{Error, Result};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "toolbridge";

pub const ENV_REDMINE_URL: &str = "REDMINE_URL";
pub const ENV_REDMINE_API_KEY: &str = "REDMINE_API_KEY";
pub const ENV_REDMINE_PROJECT_ID: &str = "REDMINE_DEFAULT_PROJECT_ID";
pub const ENV_GITLAB_URL: &str = "GITLAB_URL";
pub const ENV_GITLAB_TOKEN: &str = "GITLAB_TOKEN";
pub const ENV_MCP_SERVER_URL: &str = "MCP_SERVER_URL";
pub const ENV_LOCALE: &str = "TOOLBRIDGE_LOCALE";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Language for user-visible messages
    #[serde(default)]
    pub locale: Locale,

    /// Redmine issue tracker
    #[serde(default)]
    pub redmine: RedmineConfig,

    /// GitLab source control
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Remote MCP tool server
    #[serde(default)]
    pub mcp: McpConfig,
}

/// Redmine configuration. All three values are required to create issues.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RedmineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Numeric id of the project new issues land in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// GitLab configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// GitLab instance URL
    #[serde(default = "default_gitlab_url")]
    pub url: String,
    /// Personal access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Remote MCP tool server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Endpoint receiving JSON-RPC POSTs
    #[serde(default = "default_mcp_url")]
    pub url: String,
}

fn default_gitlab_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_mcp_url() -> String {
    "https://redmine-mcp-server.vercel.app/api/mcp".to_string()
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            url: default_gitlab_url(),
            token: None,
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            url: default_mcp_url(),
        }
    }
}

// Secrets never reach logs through Debug.
impl fmt::Debug for RedmineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedmineConfig")
            .field("url", &self.url)
            .field("api_key", &mask(&self.api_key))
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabConfig")
            .field("url", &self.url)
            .field("token", &mask(&self.token))
            .finish()
    }
}

fn mask(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "***")
}

/// Treat empty and whitespace-only values as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Config implementation
// =============================================================================

impl BridgeConfig {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: BridgeConfig = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config.normalized())
    }

    /// Overlay values from the process environment.
    pub fn with_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup.
    ///
    /// Values the lookup returns as empty are ignored, so an empty variable
    /// never clears a value set in the file.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        if let Some(url) = get(ENV_REDMINE_URL) {
            self.redmine.url = Some(url);
        }
        if let Some(key) = get(ENV_REDMINE_API_KEY) {
            self.redmine.api_key = Some(key);
        }
        if let Some(project_id) = get(ENV_REDMINE_PROJECT_ID) {
            self.redmine.project_id = Some(project_id);
        }
        if let Some(url) = get(ENV_GITLAB_URL) {
            self.gitlab.url = url;
        }
        if let Some(token) = get(ENV_GITLAB_TOKEN) {
            self.gitlab.token = Some(token);
        }
        if let Some(url) = get(ENV_MCP_SERVER_URL) {
            self.mcp.url = url;
        }
        if let Some(locale) = get(ENV_LOCALE) {
            match locale.parse() {
                Ok(locale) => self.locale = locale,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_LOCALE, e),
            }
        }

        self
    }

    /// Drop empty values a config file may contain.
    fn normalized(mut self) -> Self {
        self.redmine.url = non_empty(self.redmine.url);
        self.redmine.api_key = non_empty(self.redmine.api_key);
        self.redmine.project_id = non_empty(self.redmine.project_id);
        self.gitlab.token = non_empty(self.gitlab.token);
        self
    }

    /// Get a list of services that have every required setting.
    pub fn configured_services(&self) -> Vec<&'static str> {
        let mut services = Vec::new();
        if self.redmine.missing_keys().is_empty() {
            services.push("redmine");
        }
        if self.gitlab.token.is_some() {
            services.push("gitlab");
        }
        services
    }

    /// Render the effective configuration as TOML with secrets masked.
    pub fn to_masked_toml(&self) -> Result<String> {
        let mut masked = self.clone();
        if masked.redmine.api_key.is_some() {
            masked.redmine.api_key = Some("***".to_string());
        }
        if masked.gitlab.token.is_some() {
            masked.gitlab.token = Some("***".to_string());
        }
        toml::to_string_pretty(&masked)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}

impl RedmineConfig {
    /// Names of the required settings that are absent.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.url.is_none() {
            missing.push(ENV_REDMINE_URL);
        }
        if self.api_key.is_none() {
            missing.push(ENV_REDMINE_API_KEY);
        }
        if self.project_id.is_none() {
            missing.push(ENV_REDMINE_PROJECT_ID);
        }
        missing
    }
}

// =============================================================================
// Tests
// =============================================================================
