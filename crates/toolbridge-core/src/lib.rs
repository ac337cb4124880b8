//! Core types, configuration, and error handling for toolbridge.
//!
//! Every tool call that passes through the bridge ends as a [`ResponseEnvelope`],
//! whichever backend served it. This crate holds that envelope together with the
//! pieces every adapter shares: the error taxonomy, the configuration loaded once
//! at startup, the localized message catalog, and the closed set of tool calls.

pub mod config;
pub mod envelope;
pub mod error;
pub mod locale;
pub mod tool;

pub use config::{BridgeConfig, GitLabConfig, McpConfig, RedmineConfig};
pub use envelope::ResponseEnvelope;
pub use error::{Error, Result};
pub use locale::{Locale, Message};
pub use tool::{
    ControlLightArgs, CreateIssueArgs, MergeRequestArgs, MergeRequestState,
    ListMergeRequestsArgs, PostInlineCommentArgs, PostNoteArgs, RemoteToolArgs, ToolCall,
};
