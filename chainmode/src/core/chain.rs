//! Chain contract required by the steps, plus the concrete [`Chain`] value.
//!
//! Steps never look at conversation fields directly. They go through
//! [`ChainState`], so callers can drive their own chain types through the
//! modes as long as they can answer these few questions and carry a
//! [`ModeState`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::mode_state::ModeState;

/// What the steps need to know about a chain.
pub trait ChainState {
    /// Embedded mode bookkeeping, if it has been created yet.
    fn mode_state(&self) -> Option<&ModeState>;

    /// Slot holding the embedded mode bookkeeping.
    fn mode_state_slot(&mut self) -> &mut Option<ModeState>;

    /// Whether the model still owes a response.
    fn needs_response(&self) -> bool;

    /// Whether the latest model response requested tools that have not run yet.
    fn has_pending_tool_calls(&self) -> bool;

    /// Whether the latest message is an assistant reply without tool calls.
    fn last_is_assistant_reply(&self) -> bool;

    /// Results of the most recent tool round, when the latest message is one.
    fn last_tool_results(&self) -> Option<&[ToolResult]>;

    /// Completed model invocations, treating a missing mode state as zero.
    fn run_count(&self) -> u32 {
        self.mode_state().map_or(0, |s| s.run_count)
    }
}

/// Speaker of a chain message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Outcome of executing one [`ToolCall`].
///
/// `is_error` marks a tool that ran and reported a failure to the model. Those
/// stay in the conversation so the model can react; they never fail the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResult>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::text(Role::Assistant, content)
        }
    }

    pub fn tool_round(tool_results: Vec<ToolResult>) -> Self {
        Self {
            tool_results,
            ..Self::text(Role::Tool, "")
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
        }
    }
}

/// Conversation state driven by the modes.
///
/// Serialized as JSON by the chain store; `mode_state` travels with the
/// messages so a paused chain resumes with its run counter intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_state: Option<ModeState>,
}

impl Chain {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            mode_state: None,
        }
    }

    /// Append a message, returning the updated chain.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of assistant messages in the conversation.
    pub fn assistant_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count()
    }

    /// Tool calls of the latest message, if it is an assistant message asking for tools.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match self.last_message() {
            Some(m) if m.role == Role::Assistant => m.tool_calls.as_slice(),
            _ => &[],
        }
    }
}

impl ChainState for Chain {
    fn mode_state(&self) -> Option<&ModeState> {
        self.mode_state.as_ref()
    }

    fn mode_state_slot(&mut self) -> &mut Option<ModeState> {
        &mut self.mode_state
    }

    fn needs_response(&self) -> bool {
        match self.last_message() {
            None => false,
            Some(m) => match m.role {
                Role::User | Role::Tool => true,
                Role::Assistant => !m.tool_calls.is_empty(),
                Role::System => false,
            },
        }
    }

    fn has_pending_tool_calls(&self) -> bool {
        !self.pending_tool_calls().is_empty()
    }

    fn last_is_assistant_reply(&self) -> bool {
        matches!(
            self.last_message(),
            Some(m) if m.role == Role::Assistant && m.tool_calls.is_empty()
        )
    }

    fn last_tool_results(&self) -> Option<&[ToolResult]> {
        match self.last_message() {
            Some(m) if m.role == Role::Tool => Some(m.tool_results.as_slice()),
            _ => None,
        }
    }
}
