//! Agent module - the core loop and its advisory reminders.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Append the user turn (plus any reminder) to the conversation
//! 2. Call the model gateway with the fixed tool schema set
//! 3. If the model requests tool calls, execute them in order and feed
//!    the results back
//! 4. Repeat until the model answers without tool calls

mod agent_loop;
mod prompt;
mod reminder;

pub use agent_loop::{AgentEvent, LoopError, Session};
pub use prompt::build_system_prompt;
pub use reminder::{ReminderInjector, INITIAL_REMINDER, NAG_REMINDER};
