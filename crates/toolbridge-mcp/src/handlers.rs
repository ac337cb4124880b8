//! Tool dispatcher.
//!
//! Maps a [`ToolCall`] to the adapter that serves it and turns every outcome
//! into a [`ResponseEnvelope`]. Adapters return `Result`; nothing past this
//! point does.

use serde::Serialize;
use serde_json::{json, Value};
use toolbridge_core::{
    BridgeConfig, ControlLightArgs, CreateIssueArgs, Error, Locale, Message, ResponseEnvelope,
    Result, ToolCall,
};
use toolbridge_device::{control_light, Power};
use toolbridge_gitlab::GitLabClient;
use toolbridge_redmine::RedmineClient;
use tracing::{error, info, warn};

use crate::client::McpClient;
use crate::protocol::ToolDefinition;

/// Single entry point for tool calls.
pub struct Dispatcher {
    redmine: RedmineClient,
    gitlab: GitLabClient,
    mcp: McpClient,
    locale: Locale,
}

impl Dispatcher {
    /// Build every adapter from the shared configuration.
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            redmine: RedmineClient::new(config.redmine.clone()),
            gitlab: GitLabClient::from_config(&config.gitlab),
            mcp: McpClient::from_config(&config.mcp, config.locale),
            locale: config.locale,
        }
    }

    /// Client for the remote MCP server, for introspection.
    pub fn mcp(&self) -> &McpClient {
        &self.mcp
    }

    /// Parse and execute a tool call given by name.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ResponseEnvelope {
        match ToolCall::from_parts(name, arguments) {
            Ok(call) => self.dispatch(call).await,
            Err(e) => {
                warn!(tool = name, error = %e, "Rejected tool call");
                ResponseEnvelope::from_error(&e, self.locale, Message::RequestFailed)
            }
        }
    }

    /// Execute a parsed tool call.
    pub async fn dispatch(&self, call: ToolCall) -> ResponseEnvelope {
        let tool = call.name();
        info!(tool = tool, "Dispatching tool call");

        let envelope = match call {
            ToolCall::CreateRedmineIssue(args) => self.create_issue(&args).await,
            ToolCall::ControlLight(args) => self.control_light(&args),
            ToolCall::CallMcpTool(args) => self.mcp.call_tool(&args.tool, args.arguments).await,
            ToolCall::ListMergeRequests(args) => {
                let result = self
                    .gitlab
                    .list_merge_requests(&args.project, args.state)
                    .await
                    .map(|mrs| {
                        let message = Message::MergeRequestsListed { count: mrs.len() };
                        (message, Value::Array(mrs))
                    });
                self.gitlab_envelope(tool, result)
            }
            ToolCall::GetMergeRequestChanges(args) => {
                let result = self
                    .gitlab
                    .get_merge_request_changes(&args.project, args.mr_iid)
                    .await
                    .map(|changes| (Message::MergeRequestChanges { iid: args.mr_iid }, changes));
                self.gitlab_envelope(tool, result)
            }
            ToolCall::GetMergeRequestNotes(args) => {
                let result = self
                    .gitlab
                    .get_merge_request_notes(&args.project, args.mr_iid)
                    .await
                    .map(|notes| {
                        let message = Message::MergeRequestNotes {
                            iid: args.mr_iid,
                            count: notes.len(),
                        };
                        (message, Value::Array(notes))
                    });
                self.gitlab_envelope(tool, result)
            }
            ToolCall::GetMergeRequestCommits(args) => {
                let result = self
                    .gitlab
                    .get_merge_request_commits(&args.project, args.mr_iid)
                    .await
                    .map(|commits| {
                        let message = Message::MergeRequestCommits {
                            iid: args.mr_iid,
                            count: commits.len(),
                        };
                        (message, Value::Array(commits))
                    });
                self.gitlab_envelope(tool, result)
            }
            ToolCall::PostMergeRequestNote(args) => {
                let result = self
                    .gitlab
                    .post_merge_request_note(&args.project, args.mr_iid, &args.body)
                    .await
                    .map(|note| (Message::NotePosted { iid: args.mr_iid }, note));
                self.gitlab_envelope(tool, result)
            }
            ToolCall::PostInlineComment(args) => {
                let result = self
                    .gitlab
                    .post_merge_request_inline_comment(
                        &args.project,
                        args.mr_iid,
                        &args.body,
                        &args.position,
                    )
                    .await
                    .map(|discussion| {
                        (Message::InlineCommentPosted { iid: args.mr_iid }, discussion)
                    });
                self.gitlab_envelope(tool, result)
            }
            ToolCall::ApproveMergeRequest(args) => {
                let result = self
                    .gitlab
                    .approve_merge_request(&args.project, args.mr_iid)
                    .await
                    .map(|approval| {
                        (Message::MergeRequestApproved { iid: args.mr_iid }, approval)
                    });
                self.gitlab_envelope(tool, result)
            }
        };

        info!(tool = tool, success = envelope.success, "Tool call finished");
        envelope
    }

    async fn create_issue(&self, args: &CreateIssueArgs) -> ResponseEnvelope {
        match self.try_create_issue(args).await {
            Ok((message, data)) => ResponseEnvelope::ok(message.render(self.locale), data),
            Err(e) => {
                error!(error = %e, "Failed to create Redmine issue");
                ResponseEnvelope::from_error(&e, self.locale, Message::IssueCreateFailed)
            }
        }
    }

    async fn try_create_issue(&self, args: &CreateIssueArgs) -> Result<(Message<'static>, Value)> {
        let issue = self.redmine.create_issue(args).await?;
        let data = to_data(&issue)?;
        Ok((Message::IssueCreated { id: issue.id }, data))
    }

    fn control_light(&self, args: &ControlLightArgs) -> ResponseEnvelope {
        let outcome = control_light(args).and_then(|state| {
            let message = match state.power {
                Power::On => Message::LightOn {
                    brightness: state.brightness,
                },
                Power::Off => Message::LightOff,
            };
            Ok((message, to_data(&state)?))
        });

        match outcome {
            Ok((message, data)) => ResponseEnvelope::ok(message.render(self.locale), data),
            Err(e) => ResponseEnvelope::from_error(&e, self.locale, Message::RequestFailed),
        }
    }

    fn gitlab_envelope(
        &self,
        tool: &str,
        result: Result<(Message<'static>, Value)>,
    ) -> ResponseEnvelope {
        match result {
            Ok((message, data)) => ResponseEnvelope::ok(message.render(self.locale), data),
            Err(e) => {
                error!(tool = tool, error = %e, "GitLab call failed");
                ResponseEnvelope::from_error(&e, self.locale, Message::GitLabFailed)
            }
        }
    }

    /// Tool definitions with JSON schemas, as published over `tools/list`.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let merge_request = json!({
            "type": "object",
            "properties": {
                "project": project_schema(),
                "mr_iid": mr_iid_schema()
            },
            "required": ["project", "mr_iid"]
        });

        vec![
            ToolDefinition {
                name: "create_redmine_issue".to_string(),
                description: "Create an issue in the configured Redmine project".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "subject": {
                            "type": "string",
                            "description": "Issue title"
                        },
                        "description": {
                            "type": "string",
                            "description": "Issue body"
                        },
                        "priority_id": {
                            "type": "integer",
                            "description": "3=Low, 4=Normal, 5=High, 6=Urgent, 7=Immediate (default: 4)"
                        },
                        "tracker_id": {
                            "type": "integer",
                            "description": "1=Bug, 2=Feature, 3=Support (default: 2)"
                        },
                        "estimated_hours": {
                            "type": "number",
                            "description": "Estimated effort in hours"
                        }
                    },
                    "required": ["subject"]
                }),
            },
            ToolDefinition {
                name: "control_light".to_string(),
                description: "Turn the smart light on or off".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "action": {
                            "type": "string",
                            "enum": ["on", "off"]
                        },
                        "brightness": {
                            "type": "integer",
                            "minimum": 0,
                            "maximum": 100,
                            "description": "Brightness when turning on (default: 100)"
                        }
                    },
                    "required": ["action"]
                }),
            },
            ToolDefinition {
                name: "call_mcp_tool".to_string(),
                description: "Call a tool on the remote MCP server".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "tool": {
                            "type": "string",
                            "description": "Remote tool name"
                        },
                        "arguments": {
                            "type": "object",
                            "description": "Arguments passed to the remote tool"
                        }
                    },
                    "required": ["tool"]
                }),
            },
            ToolDefinition {
                name: "gitlab_list_merge_requests".to_string(),
                description: "List merge requests of a GitLab project".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "project": project_schema(),
                        "state": {
                            "type": "string",
                            "enum": ["opened", "closed", "merged", "all"],
                            "description": "Filter by state (default: opened)"
                        }
                    },
                    "required": ["project"]
                }),
            },
            ToolDefinition {
                name: "gitlab_get_merge_request_changes".to_string(),
                description: "Get the diff of a merge request".to_string(),
                input_schema: merge_request.clone(),
            },
            ToolDefinition {
                name: "gitlab_get_merge_request_notes".to_string(),
                description: "Get the comments on a merge request".to_string(),
                input_schema: merge_request.clone(),
            },
            ToolDefinition {
                name: "gitlab_get_merge_request_commits".to_string(),
                description: "Get the commits of a merge request".to_string(),
                input_schema: merge_request.clone(),
            },
            ToolDefinition {
                name: "gitlab_post_merge_request_note".to_string(),
                description: "Post a general comment on a merge request".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "project": project_schema(),
                        "mr_iid": mr_iid_schema(),
                        "body": {
                            "type": "string",
                            "description": "Comment text (Markdown)"
                        }
                    },
                    "required": ["project", "mr_iid", "body"]
                }),
            },
            ToolDefinition {
                name: "gitlab_post_inline_comment".to_string(),
                description: "Comment on a specific line of a merge request diff".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "project": project_schema(),
                        "mr_iid": mr_iid_schema(),
                        "body": {
                            "type": "string",
                            "description": "Comment text (Markdown)"
                        },
                        "position": {
                            "type": "object",
                            "description": "GitLab diff position (base_sha, start_sha, head_sha, position_type, new_path, new_line, ...)"
                        }
                    },
                    "required": ["project", "mr_iid", "body", "position"]
                }),
            },
            ToolDefinition {
                name: "gitlab_approve_merge_request".to_string(),
                description: "Approve a merge request".to_string(),
                input_schema: merge_request,
            },
        ]
    }
}

fn project_schema() -> Value {
    json!({
        "type": "string",
        "description": "Project path (group/project) or numeric id"
    })
}

fn mr_iid_schema() -> Value {
    json!({
        "type": "integer",
        "description": "Merge request IID within the project"
    })
}

fn to_data<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(Error::from)
}
