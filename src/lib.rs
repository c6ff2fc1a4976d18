//! # minicoder
//!
//! A minimal autonomous coding agent: a language model in a tool loop,
//! confined to a sandboxed workspace.
//!
//! This library provides:
//! - An agent loop that drives a conversation against a model gateway
//! - A fixed tool set: shell, file read/write/edit, and a task list
//! - Sandboxed filesystem and shell executors bounded to a workspace root
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Append the user turn (plus any soft reminder) to the conversation
//! 2. Call the model gateway with the conversation and tool schemas
//! 3. If the model requests tool calls, execute them in order and feed
//!    the results back
//! 4. Repeat until the model answers without tool calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use minicoder::{agent::Session, config::Config, llm::AnthropicGateway, tools::Workspace};
//!
//! let config = Config::from_env()?;
//! let workspace = Workspace::new(&config.workspace_path)?;
//! let gateway = Arc::new(AnthropicGateway::new(&config));
//! let mut session = Session::new(gateway, workspace, config.max_rounds);
//! let answer = session.run_turn("create hello.txt containing hi").await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
