//! Model gateway: conversation wire types and the transport trait.
//!
//! The agent core consumes the gateway through the [`Gateway`] trait so
//! tests can substitute a scripted implementation for the HTTP client.

mod anthropic;

pub use anthropic::AnthropicGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Conversation roles on the wire. Tool results travel back to the model
/// as `User` turns containing `tool_result` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One ordered content block within a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// One unit of exchange in the conversation. Append-only: once pushed
/// onto the history a turn is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Turn {
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// Concatenated text of every `Text` block in this turn.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Why the model stopped emitting content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Final answer; no tool calls pending.
    EndTurn,
    /// The response contains tool-use blocks awaiting execution.
    ToolUse,
    /// The response was cut off by the token limit.
    MaxTokens,
    Unknown,
}

impl StopReason {
    /// Decode the wire spelling. Unrecognized values map to `Unknown`
    /// rather than failing, so new stop reasons degrade to a final turn.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("end_turn") => Self::EndTurn,
            Some("tool_use") => Self::ToolUse,
            Some("max_tokens") => Self::MaxTokens,
            _ => Self::Unknown,
        }
    }
}

/// A complete (non-streaming) model response.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
}

/// A named tool the model may request, with its JSON argument schema.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Failure in the gateway call itself. These abort the current outer
/// turn; tool failures never surface here.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("gateway returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed gateway response: {0}")]
    Malformed(String),
}

/// The model request/response endpoint consumed by the agent loop.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send the full conversation plus the tool schema set; suspend
    /// until the model responds.
    async fn complete(
        &self,
        system: &str,
        turns: &[Turn],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, GatewayError>;
}
