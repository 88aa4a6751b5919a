//! Failure taxonomy carried by [`PipelineValue::Failed`](crate::core::pipeline::PipelineValue).
//!
//! Reaching a run limit is not represented here: it surfaces as a pause.

use thiserror::Error;

/// The model call did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("provider rejected the request: {0}")]
    Provider(String),
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("no scripted response left for turn {turn}")]
    Exhausted { turn: usize },
}

/// Unrecoverable failure of the tool layer.
///
/// A tool that merely reports an error to the model is not one of these; that
/// outcome is recorded as an error tool result inside the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fatal tool failure in '{tool}': {message}")]
pub struct ToolExecutionError {
    pub tool: String,
    pub message: String,
}

impl ToolExecutionError {
    pub fn new(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("until-tool-used mode requires a tool name")]
    MissingToolName,
}

/// Reason attached to a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    #[error(transparent)]
    ToolExecution(#[from] ToolExecutionError),
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error("run count {run_count} cannot be advanced")]
    RunCountOverflow { run_count: u32 },
}
