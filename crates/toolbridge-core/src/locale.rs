//! Human-readable messages placed in the envelope `message` field.
//!
//! Messages are a closed set rendered per [`Locale`]. The `error` field of an
//! envelope is never localized.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Language used for user-visible messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "vi" | "vietnamese" => Ok(Locale::Vi),
            other => Err(Error::Config(format!("Unsupported locale: {}", other))),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => f.write_str("en"),
            Locale::Vi => f.write_str("vi"),
        }
    }
}

/// Every user-visible message the bridge can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Message<'a> {
    LightOn { brightness: u8 },
    LightOff,
    IssueCreated { id: u64 },
    IssueCreateFailed(String),
    ToolExecuted,
    RemoteToolFailed(String),
    MergeRequestsListed { count: usize },
    MergeRequestChanges { iid: u64 },
    MergeRequestNotes { iid: u64, count: usize },
    MergeRequestCommits { iid: u64, count: usize },
    NotePosted { iid: u64 },
    InlineCommentPosted { iid: u64 },
    MergeRequestApproved { iid: u64 },
    GitLabFailed(String),
    RequestFailed(String),
    NotConfigured {
        service: &'a str,
        keys: &'a [&'static str],
    },
    InvalidInput(&'a str),
    InvalidAction(&'a str),
    UnknownTool(&'a str),
}

impl Message<'_> {
    /// Render the message in the given locale.
    pub fn render(&self, locale: Locale) -> String {
        match locale {
            Locale::En => self.render_en(),
            Locale::Vi => self.render_vi(),
        }
    }

    fn render_en(&self) -> String {
        match self {
            Message::LightOn { brightness } => {
                format!("Light turned on at {}% brightness", brightness)
            }
            Message::LightOff => "Light turned off".to_string(),
            Message::IssueCreated { id } => format!("Created issue #{} successfully", id),
            Message::IssueCreateFailed(detail) => format!("Failed to create issue: {}", detail),
            Message::ToolExecuted => "Tool executed successfully".to_string(),
            Message::RemoteToolFailed(detail) => format!("Failed to call MCP tool: {}", detail),
            Message::MergeRequestsListed { count } => format!("Found {} merge requests", count),
            Message::MergeRequestChanges { iid } => {
                format!("Loaded changes for merge request !{}", iid)
            }
            Message::MergeRequestNotes { iid, count } => {
                format!("Merge request !{} has {} notes", iid, count)
            }
            Message::MergeRequestCommits { iid, count } => {
                format!("Merge request !{} has {} commits", iid, count)
            }
            Message::NotePosted { iid } => format!("Posted comment on merge request !{}", iid),
            Message::InlineCommentPosted { iid } => {
                format!("Posted inline comment on merge request !{}", iid)
            }
            Message::MergeRequestApproved { iid } => format!("Approved merge request !{}", iid),
            Message::GitLabFailed(detail) => format!("GitLab request failed: {}", detail),
            Message::RequestFailed(detail) => format!("Request failed: {}", detail),
            Message::NotConfigured { service, keys } => format!(
                "{} is not configured. Set {}",
                service,
                keys.join(", ")
            ),
            Message::InvalidInput(detail) => format!("Invalid input: {}", detail),
            Message::InvalidAction(detail) => format!("Invalid action: {}", detail),
            Message::UnknownTool(name) => format!("Unknown tool: {}", name),
        }
    }

    fn render_vi(&self) -> String {
        match self {
            Message::LightOn { brightness } => {
                format!("Đã bật đèn với độ sáng {}%", brightness)
            }
            Message::LightOff => "Đã tắt đèn".to_string(),
            Message::IssueCreated { id } => format!("Đã tạo issue #{} thành công", id),
            Message::IssueCreateFailed(detail) => format!("Lỗi khi tạo issue: {}", detail),
            Message::ToolExecuted => "Đã thực thi tool thành công".to_string(),
            Message::RemoteToolFailed(detail) => format!("Lỗi khi gọi MCP tool: {}", detail),
            Message::MergeRequestsListed { count } => {
                format!("Tìm thấy {} merge request", count)
            }
            Message::MergeRequestChanges { iid } => {
                format!("Đã tải thay đổi của merge request !{}", iid)
            }
            Message::MergeRequestNotes { iid, count } => {
                format!("Merge request !{} có {} bình luận", iid, count)
            }
            Message::MergeRequestCommits { iid, count } => {
                format!("Merge request !{} có {} commit", iid, count)
            }
            Message::NotePosted { iid } => {
                format!("Đã bình luận vào merge request !{}", iid)
            }
            Message::InlineCommentPosted { iid } => {
                format!("Đã bình luận trên dòng code của merge request !{}", iid)
            }
            Message::MergeRequestApproved { iid } => {
                format!("Đã approve merge request !{}", iid)
            }
            Message::GitLabFailed(detail) => format!("Lỗi khi gọi GitLab: {}", detail),
            Message::RequestFailed(detail) => format!("Yêu cầu thất bại: {}", detail),
            Message::NotConfigured { service, keys } => format!(
                "{} chưa được cấu hình. Cần set {}",
                service,
                keys.join(", ")
            ),
            Message::InvalidInput(detail) => format!("Dữ liệu không hợp lệ: {}", detail),
            Message::InvalidAction(detail) => format!("Hành động không hợp lệ: {}", detail),
            Message::UnknownTool(name) => format!("Không hỗ trợ tool: {}", name),
        }
    }
}
