//! Redmine API request/response types and the issue record handed to callers.

use serde::{Deserialize, Serialize};

// =============================================================================
// Lookup tables
// =============================================================================

/// Redmine issue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
    Immediate,
}

impl Priority {
    /// Resolve a priority id. Unknown ids fall back to `Normal`.
    pub fn from_id(id: u32) -> Self {
        match id {
            3 => Priority::Low,
            4 => Priority::Normal,
            5 => Priority::High,
            6 => Priority::Urgent,
            7 => Priority::Immediate,
            _ => Priority::Normal,
        }
    }
}

/// Redmine tracker (issue category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tracker {
    Bug,
    Feature,
    Support,
}

impl Tracker {
    /// Resolve a tracker id. Unknown ids fall back to `Feature`.
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => Tracker::Bug,
            2 => Tracker::Feature,
            3 => Tracker::Support,
            _ => Tracker::Feature,
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// Body of `POST /issues.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIssuePayload {
    pub issue: NewIssue,
}

/// Issue fields. Optional fields are omitted, never sent as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewIssue {
    pub project_id: u64,
    pub subject: String,
    pub tracker_id: u32,
    pub priority_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreateIssueResponse {
    pub issue: Option<CreatedIssue>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreatedIssue {
    pub id: Option<u64>,
}

/// Issue created in Redmine, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteIssue {
    pub id: u64,
    pub url: String,
    pub subject: String,
    pub priority: Priority,
    pub tracker: Tracker,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_lookup() {
        assert_eq!(Priority::from_id(3), Priority::Low);
        assert_eq!(Priority::from_id(7), Priority::Immediate);
        assert_eq!(Priority::from_id(99), Priority::Normal);
        assert_eq!(Priority::from_id(0), Priority::Normal);
    }

    #[test]
    fn test_tracker_lookup() {
        assert_eq!(Tracker::from_id(1), Tracker::Bug);
        assert_eq!(Tracker::from_id(3), Tracker::Support);
        assert_eq!(Tracker::from_id(42), Tracker::Feature);
    }

    #[test]
    fn test_remote_issue_serializes_names() {
        let issue = RemoteIssue {
            id: 12,
            url: "https://redmine.example.com/issues/12".to_string(),
            subject: "Fix bug".to_string(),
            priority: Priority::Urgent,
            tracker: Tracker::Bug,
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["priority"], "Urgent");
        assert_eq!(json["tracker"], "Bug");
    }
}
