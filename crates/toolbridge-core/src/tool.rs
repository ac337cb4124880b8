//! The closed set of tools the bridge exposes, with their argument schemas.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Arguments for `create_redmine_issue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIssueArgs {
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 3=Low, 4=Normal, 5=High, 6=Urgent, 7=Immediate
    #[serde(default = "default_priority_id")]
    pub priority_id: u32,
    /// 1=Bug, 2=Feature, 3=Support
    #[serde(default = "default_tracker_id")]
    pub tracker_id: u32,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
}

fn default_priority_id() -> u32 {
    4
}

fn default_tracker_id() -> u32 {
    2
}

impl CreateIssueArgs {
    /// Issue with default priority and tracker.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            description: None,
            priority_id: default_priority_id(),
            tracker_id: default_tracker_id(),
            estimated_hours: None,
        }
    }
}

/// Arguments for `control_light`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlLightArgs {
    pub action: String,
    /// Kept raw: only `on` reads it, so `off` accepts any value.
    #[serde(default)]
    pub brightness: Option<Value>,
}

/// Arguments for `call_mcp_tool`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteToolArgs {
    /// Tool name on the remote server
    pub tool: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Merge request state filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestState {
    #[default]
    Opened,
    Closed,
    Merged,
    All,
}

impl MergeRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeRequestState::Opened => "opened",
            MergeRequestState::Closed => "closed",
            MergeRequestState::Merged => "merged",
            MergeRequestState::All => "all",
        }
    }
}

/// Arguments for `gitlab_list_merge_requests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListMergeRequestsArgs {
    /// Project path (`group/project`) or numeric id
    pub project: String,
    #[serde(default)]
    pub state: MergeRequestState,
}

/// Arguments for the read-only single merge request tools and approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequestArgs {
    pub project: String,
    pub mr_iid: u64,
}

/// Arguments for `gitlab_post_merge_request_note`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostNoteArgs {
    pub project: String,
    pub mr_iid: u64,
    pub body: String,
}

/// Arguments for `gitlab_post_inline_comment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostInlineCommentArgs {
    pub project: String,
    pub mr_iid: u64,
    pub body: String,
    /// Passed to GitLab unmodified
    pub position: Value,
}

/// A single tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    CreateRedmineIssue(CreateIssueArgs),
    ControlLight(ControlLightArgs),
    CallMcpTool(RemoteToolArgs),
    ListMergeRequests(ListMergeRequestsArgs),
    GetMergeRequestChanges(MergeRequestArgs),
    GetMergeRequestNotes(MergeRequestArgs),
    GetMergeRequestCommits(MergeRequestArgs),
    PostMergeRequestNote(PostNoteArgs),
    PostInlineComment(PostInlineCommentArgs),
    ApproveMergeRequest(MergeRequestArgs),
}

impl ToolCall {
    /// Wire names of every supported tool.
    pub const NAMES: &'static [&'static str] = &[
        "create_redmine_issue",
        "control_light",
        "call_mcp_tool",
        "gitlab_list_merge_requests",
        "gitlab_get_merge_request_changes",
        "gitlab_get_merge_request_notes",
        "gitlab_get_merge_request_commits",
        "gitlab_post_merge_request_note",
        "gitlab_post_inline_comment",
        "gitlab_approve_merge_request",
    ];

    /// Parse a tool name and its JSON arguments.
    ///
    /// Missing arguments are treated as an empty object.
    pub fn from_parts(name: &str, arguments: Option<Value>) -> Result<Self> {
        let arguments = arguments.unwrap_or_else(|| Value::Object(Map::new()));

        let call = match name {
            "create_redmine_issue" => Self::CreateRedmineIssue(parse_args(name, arguments)?),
            "control_light" => Self::ControlLight(parse_args(name, arguments)?),
            "call_mcp_tool" => Self::CallMcpTool(parse_args(name, arguments)?),
            "gitlab_list_merge_requests" => Self::ListMergeRequests(parse_args(name, arguments)?),
            "gitlab_get_merge_request_changes" => {
                Self::GetMergeRequestChanges(parse_args(name, arguments)?)
            }
            "gitlab_get_merge_request_notes" => {
                Self::GetMergeRequestNotes(parse_args(name, arguments)?)
            }
            "gitlab_get_merge_request_commits" => {
                Self::GetMergeRequestCommits(parse_args(name, arguments)?)
            }
            "gitlab_post_merge_request_note" => {
                Self::PostMergeRequestNote(parse_args(name, arguments)?)
            }
            "gitlab_post_inline_comment" => Self::PostInlineComment(parse_args(name, arguments)?),
            "gitlab_approve_merge_request" => {
                Self::ApproveMergeRequest(parse_args(name, arguments)?)
            }
            other => return Err(Error::UnknownTool(other.to_string())),
        };

        Ok(call)
    }

    /// Wire name of this tool.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRedmineIssue(_) => "create_redmine_issue",
            Self::ControlLight(_) => "control_light",
            Self::CallMcpTool(_) => "call_mcp_tool",
            Self::ListMergeRequests(_) => "gitlab_list_merge_requests",
            Self::GetMergeRequestChanges(_) => "gitlab_get_merge_request_changes",
            Self::GetMergeRequestNotes(_) => "gitlab_get_merge_request_notes",
            Self::GetMergeRequestCommits(_) => "gitlab_get_merge_request_commits",
            Self::PostMergeRequestNote(_) => "gitlab_post_merge_request_note",
            Self::PostInlineComment(_) => "gitlab_post_inline_comment",
            Self::ApproveMergeRequest(_) => "gitlab_approve_merge_request",
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| Error::InvalidInput(format!("invalid arguments for {}: {}", tool, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_defaults() {
        let call =
            ToolCall::from_parts("create_redmine_issue", Some(json!({"subject": "Fix bug"})))
                .unwrap();

        match call {
            ToolCall::CreateRedmineIssue(args) => {
                assert_eq!(args, CreateIssueArgs::new("Fix bug"));
                assert_eq!(args.priority_id, 4);
                assert_eq!(args.tracker_id, 2);
            }
            other => panic!("Expected issue call, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_request_state_default() {
        let call = ToolCall::from_parts(
            "gitlab_list_merge_requests",
            Some(json!({"project": "group/app"})),
        )
        .unwrap();

        assert_eq!(
            call,
            ToolCall::ListMergeRequests(ListMergeRequestsArgs {
                project: "group/app".to_string(),
                state: MergeRequestState::Opened,
            })
        );
    }

    #[test]
    fn test_invalid_state_rejected() {
        let err = ToolCall::from_parts(
            "gitlab_list_merge_requests",
            Some(json!({"project": "group/app", "state": "reopened"})),
        )
        .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_tool() {
        let err = ToolCall::from_parts("launch_rocket", None).unwrap_err();
        assert!(matches!(err, Error::UnknownTool(name) if name == "launch_rocket"));
    }

    #[test]
    fn test_missing_required_argument() {
        let err = ToolCall::from_parts("control_light", None).unwrap_err();
        assert!(err.to_string().contains("control_light"));
    }

    #[test]
    fn test_remote_tool_arguments_default_to_empty() {
        let call =
            ToolCall::from_parts("call_mcp_tool", Some(json!({"tool": "list_projects"}))).unwrap();
        match call {
            ToolCall::CallMcpTool(args) => {
                assert_eq!(args.tool, "list_projects");
                assert!(args.arguments.is_empty());
            }
            other => panic!("Expected remote tool call, got {:?}", other),
        }
    }

    #[test]
    fn test_names_round_trip() {
        let samples = [
            json!({"subject": "s"}),
            json!({"action": "on"}),
            json!({"tool": "t"}),
            json!({"project": "p"}),
            json!({"project": "p", "mr_iid": 1}),
            json!({"project": "p", "mr_iid": 1}),
            json!({"project": "p", "mr_iid": 1}),
            json!({"project": "p", "mr_iid": 1, "body": "b"}),
            json!({"project": "p", "mr_iid": 1, "body": "b", "position": {}}),
            json!({"project": "p", "mr_iid": 1}),
        ];

        for (name, args) in ToolCall::NAMES.iter().zip(samples) {
            let call = ToolCall::from_parts(name, Some(args)).unwrap();
            assert_eq!(call.name(), *name);
        }
    }
}
