//! Tool dispatch and the fixed tool set.
//!
//! Dispatch never raises to the agent loop: every failure inside a tool
//! is a typed [`ToolError`] that gets rendered as an error-prefixed text
//! result at this boundary, so the model observes the failure as data
//! and decides whether to retry.

mod fs;
mod shell;
mod tasks;

pub use fs::Workspace;
pub use shell::{ShellExecutor, COMMAND_TIMEOUT_SECS};
pub use tasks::{TaskItem, TaskList, TaskStatus, MAX_TASKS};

use serde_json::{json, Value};
use thiserror::Error;

use crate::llm::ToolDefinition;

/// Hard cap, in characters, on any tool result fed back to the model.
pub const MAX_RESULT_CHARS: usize = 50_000;

/// Typed failure produced inside a tool. Converted to display text only
/// at the dispatch boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("path escapes workspace: {0}")]
    PathEscape(String),

    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("text not found in {0}")]
    NotFound(String),

    #[error("dangerous command blocked (matched {0:?})")]
    Blocked(String),

    #[error("command timed out after {0} seconds")]
    Timeout(u64),

    #[error("command failed: {0}")]
    Shell(std::io::Error),

    #[error("{0}")]
    Validation(String),

    #[error("invalid arguments for {tool}: {reason}")]
    BadArgs { tool: &'static str, reason: String },
}

/// A tool request parsed from the model's tool-use block.
///
/// The tool set is closed; anything else lands in `Unknown`, which flows
/// through dispatch as data instead of aborting the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    Bash {
        command: String,
    },
    ReadFile {
        path: String,
        limit: Option<usize>,
    },
    WriteFile {
        path: String,
        content: String,
    },
    EditFile {
        path: String,
        old_text: String,
        new_text: String,
    },
    /// Carries the raw `items` value; structural validation is the task
    /// list manager's job so violations report as validation errors.
    UpdateTasks {
        items: Value,
    },
    Unknown {
        name: String,
    },
}

impl ToolRequest {
    /// Parse a named tool call against the fixed per-tool schemas.
    pub fn parse(name: &str, input: &Value) -> Result<Self, ToolError> {
        match name {
            "bash" => Ok(Self::Bash {
                command: require_str(input, "command", "bash")?,
            }),
            "read_file" => Ok(Self::ReadFile {
                path: require_str(input, "path", "read_file")?,
                limit: input.get("limit").and_then(Value::as_u64).map(|n| n as usize),
            }),
            "write_file" => Ok(Self::WriteFile {
                path: require_str(input, "path", "write_file")?,
                content: require_str(input, "content", "write_file")?,
            }),
            "edit_file" => Ok(Self::EditFile {
                path: require_str(input, "path", "edit_file")?,
                old_text: require_str(input, "old_text", "edit_file")?,
                new_text: require_str(input, "new_text", "edit_file")?,
            }),
            "update_tasks" => Ok(Self::UpdateTasks {
                items: input.get("items").cloned().unwrap_or(Value::Null),
            }),
            other => Ok(Self::Unknown {
                name: other.to_string(),
            }),
        }
    }

    pub fn is_task_update(&self) -> bool {
        matches!(self, Self::UpdateTasks { .. })
    }
}

fn require_str(input: &Value, field: &str, tool: &'static str) -> Result<String, ToolError> {
    input
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::BadArgs {
            tool,
            reason: format!("missing required string field '{field}'"),
        })
}

/// Outcome of one dispatched tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Text fed back to the model, truncated to [`MAX_RESULT_CHARS`].
    pub text: String,
    /// Whether the call failed; the text carries the error rendering.
    pub is_error: bool,
    /// Whether the call was an `update_tasks` request. The reminder
    /// counter resets on batches that include one.
    pub task_update: bool,
}

/// The dispatch target: the sandboxed workspace, the shell executor and
/// the task list, bundled per session. Nothing here is global; each
/// session owns its own instance.
pub struct Toolbox {
    workspace: Workspace,
    shell: ShellExecutor,
    tasks: TaskList,
}

impl Toolbox {
    pub fn new(workspace: Workspace) -> Self {
        let shell = ShellExecutor::new(workspace.root().to_path_buf());
        Self {
            workspace,
            shell,
            tasks: TaskList::new(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// Execute one tool call. Never fails: bad arguments, unknown tools
    /// and tool errors all come back as text results.
    pub async fn dispatch(&mut self, name: &str, input: &Value) -> DispatchOutcome {
        let request = match ToolRequest::parse(name, input) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "rejected tool arguments");
                return DispatchOutcome {
                    text: format!("Error: {err}"),
                    is_error: true,
                    task_update: false,
                };
            }
        };

        let task_update = request.is_task_update();
        let (text, is_error) = match self.execute(request).await {
            Ok(text) => (text, false),
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "tool call failed");
                (format!("Error: {err}"), true)
            }
        };

        DispatchOutcome {
            text: truncate_chars(text, MAX_RESULT_CHARS),
            is_error,
            task_update,
        }
    }

    async fn execute(&mut self, request: ToolRequest) -> Result<String, ToolError> {
        match request {
            ToolRequest::Bash { command } => self.shell.execute(&command).await,
            ToolRequest::ReadFile { path, limit } => self.workspace.read(&path, limit).await,
            ToolRequest::WriteFile { path, content } => {
                self.workspace.write(&path, &content).await
            }
            ToolRequest::EditFile {
                path,
                old_text,
                new_text,
            } => self.workspace.edit(&path, &old_text, &new_text).await,
            ToolRequest::UpdateTasks { items } => self.tasks.update(&items),
            ToolRequest::Unknown { name } => Ok(format!("Unknown tool: {name}")),
        }
    }
}

/// Definitions for the fixed tool set, in the shape the gateway expects.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "bash".to_string(),
            description: "Run a shell command in the workspace. Returns combined stdout and stderr.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string", "description": "The shell command to execute" }
                },
                "required": ["command"]
            }),
        },
        ToolDefinition {
            name: "read_file".to_string(),
            description: "Read file contents. Optionally limit the number of lines returned.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path, relative to the workspace" },
                    "limit": { "type": "integer", "description": "Maximum number of lines to return" }
                },
                "required": ["path"]
            }),
        },
        ToolDefinition {
            name: "write_file".to_string(),
            description: "Write content to a file, creating parent directories and overwriting any existing file.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path, relative to the workspace" },
                    "content": { "type": "string", "description": "Full file content" }
                },
                "required": ["path", "content"]
            }),
        },
        ToolDefinition {
            name: "edit_file".to_string(),
            description: "Replace the first occurrence of old_text in a file with new_text. The match is literal.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path, relative to the workspace" },
                    "old_text": { "type": "string", "description": "Exact text to find" },
                    "new_text": { "type": "string", "description": "Replacement text" }
                },
                "required": ["path", "old_text", "new_text"]
            }),
        },
        ToolDefinition {
            name: "update_tasks".to_string(),
            description: "Replace the task list. Use to plan multi-step work and track progress.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "content": { "type": "string", "description": "Task description" },
                                "status": { "type": "string", "enum": ["pending", "in_progress", "completed"] },
                                "activeForm": { "type": "string", "description": "Present tense, e.g. 'Reading files'" }
                            },
                            "required": ["content", "status", "activeForm"]
                        }
                    }
                },
                "required": ["items"]
            }),
        },
    ]
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub(crate) fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((index, _)) = text.char_indices().nth(max) {
        text.truncate(index);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn toolbox() -> (TempDir, Toolbox) {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path()).unwrap();
        (dir, Toolbox::new(workspace))
    }

    #[tokio::test]
    async fn unknown_tool_yields_fixed_result_not_error() {
        let (_dir, mut toolbox) = toolbox();
        let outcome = toolbox.dispatch("frobnicate", &json!({})).await;
        assert_eq!(outcome.text, "Unknown tool: frobnicate");
        assert!(!outcome.is_error);
        assert!(!outcome.task_update);
    }

    #[tokio::test]
    async fn missing_argument_is_reported_as_error_text() {
        let (_dir, mut toolbox) = toolbox();
        let outcome = toolbox.dispatch("bash", &json!({})).await;
        assert!(outcome.text.starts_with("Error: "), "got: {}", outcome.text);
        assert!(outcome.is_error);
    }

    #[tokio::test]
    async fn write_then_read_in_one_batch_order() {
        let (_dir, mut toolbox) = toolbox();
        let written = toolbox
            .dispatch("write_file", &json!({"path": "a.txt", "content": "hi"}))
            .await;
        assert_eq!(written.text, "Wrote 2 bytes to a.txt");

        let read = toolbox.dispatch("read_file", &json!({"path": "a.txt"})).await;
        assert_eq!(read.text, "hi");
    }

    #[tokio::test]
    async fn update_tasks_flags_the_batch_even_on_validation_failure() {
        let (_dir, mut toolbox) = toolbox();
        let outcome = toolbox
            .dispatch("update_tasks", &json!({"items": "not a list"}))
            .await;
        assert!(outcome.is_error);
        assert!(outcome.task_update);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "héllo".repeat(3);
        let truncated = truncate_chars(text, 7);
        assert_eq!(truncated, "héllohé");
    }

    #[test]
    fn definitions_cover_the_fixed_tool_set() {
        let names: Vec<String> = definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            ["bash", "read_file", "write_file", "edit_file", "update_tasks"]
        );
    }
}
