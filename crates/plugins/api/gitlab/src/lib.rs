//! GitLab adapter for toolbridge.
//!
//! Covers the merge request lifecycle: listing, reading changes, notes and
//! commits, commenting (general and inline), and approval. Responses are
//! forwarded as opaque JSON; the adapter only owns transport and auth.

mod client;

pub use client::{encode_project, GitLabClient};

/// Default GitLab API URL.
pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";
