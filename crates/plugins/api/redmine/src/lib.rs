//! Redmine adapter for toolbridge.
//!
//! Creates issues through the Redmine REST API and reports them back as
//! [`RemoteIssue`] records with human-readable priority and tracker names.

mod client;
mod types;

pub use client::RedmineClient;
pub use types::*;
