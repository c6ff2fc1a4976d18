//! Core agent loop implementation.
//!
//! Drives the conversation against the model gateway and the tool
//! dispatch until the gateway produces a final answer. Tool failures
//! never abort the loop; only gateway failures (and the round cap) do,
//! and those terminate just the current outer turn.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::llm::{ContentBlock, Gateway, GatewayError, Role, StopReason, ToolDefinition, Turn};
use crate::tools::{self, TaskList, Toolbox, Workspace};

use super::prompt::build_system_prompt;
use super::reminder::ReminderInjector;

/// Observable loop activity. The loop does no printing of its own;
/// hosts subscribe to this stream instead.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Text the model emitted, alongside or instead of tool calls.
    ModelText(String),
    /// A tool call is about to execute.
    ToolStarted { name: String },
    /// A tool call finished; `result` is the text fed back to the model.
    ToolFinished { name: String, result: String },
}

type EventCallback = Box<dyn Fn(&AgentEvent) + Send + Sync>;

/// Failure that aborts the current outer turn.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("no final answer after {0} rounds")]
    RoundsExhausted(usize),
}

/// One interactive agent session: owns the conversation, the toolbox
/// and the reminder state. Sessions are independent; running several
/// side by side needs nothing more than separate workspace roots.
pub struct Session {
    gateway: Arc<dyn Gateway>,
    system_prompt: String,
    tool_definitions: Vec<ToolDefinition>,
    toolbox: Toolbox,
    reminder: ReminderInjector,
    turns: Vec<Turn>,
    max_rounds: usize,
    on_event: Option<EventCallback>,
}

impl Session {
    pub fn new(gateway: Arc<dyn Gateway>, workspace: Workspace, max_rounds: usize) -> Self {
        let system_prompt = build_system_prompt(workspace.root());
        Self {
            gateway,
            system_prompt,
            tool_definitions: tools::definitions(),
            toolbox: Toolbox::new(workspace),
            reminder: ReminderInjector::new(),
            turns: Vec::new(),
            max_rounds,
            on_event: None,
        }
    }

    /// Register an observer for intermediate model text and
    /// tool-call/result pairs.
    pub fn on_event(mut self, callback: impl Fn(&AgentEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Box::new(callback));
        self
    }

    /// The conversation so far. Append-only; turns are never rewritten.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn tasks(&self) -> &TaskList {
        self.toolbox.tasks()
    }

    /// Drive one outer turn: append the user utterance (with any
    /// reminder) and alternate gateway calls with tool batches until
    /// the model stops asking for tools. Returns the final assistant
    /// text.
    pub async fn run_turn(&mut self, user_text: &str) -> Result<String, LoopError> {
        let mut content = Vec::new();
        if let Some(reminder) = self.reminder.next_reminder() {
            content.push(ContentBlock::text(reminder));
        }
        content.push(ContentBlock::text(user_text));
        self.turns.push(Turn::user(content));

        for round in 0..self.max_rounds {
            debug!(round, turns = self.turns.len(), "awaiting model");
            let response = self
                .gateway
                .complete(&self.system_prompt, &self.turns, &self.tool_definitions)
                .await?;

            for block in &response.content {
                if let ContentBlock::Text { text } = block {
                    self.emit(AgentEvent::ModelText(text.clone()));
                }
            }

            if response.stop_reason != StopReason::ToolUse {
                let assistant = Turn::assistant(response.content);
                let final_text = assistant.text();
                self.turns.push(assistant);
                return Ok(final_text);
            }

            // Strictly sequential, in emission order: later calls may
            // depend on earlier calls' side effects.
            let mut results = Vec::new();
            let mut updated_tasks = false;
            for block in &response.content {
                let ContentBlock::ToolUse { id, name, input } = block else {
                    continue;
                };

                self.emit(AgentEvent::ToolStarted { name: name.clone() });
                let outcome = self.toolbox.dispatch(name, input).await;
                updated_tasks |= outcome.task_update;
                self.emit(AgentEvent::ToolFinished {
                    name: name.clone(),
                    result: outcome.text.clone(),
                });

                results.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content: outcome.text,
                    is_error: outcome.is_error.then_some(true),
                });
            }

            self.reminder.record_batch(updated_tasks);

            // The assistant turn with its tool-call blocks, then one
            // turn bundling every result of the batch.
            self.turns.push(Turn::assistant(response.content));
            self.turns.push(Turn {
                role: Role::User,
                content: results,
            });
        }

        Err(LoopError::RoundsExhausted(self.max_rounds))
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(ref callback) = self.on_event {
            callback(&event);
        }
    }
}
