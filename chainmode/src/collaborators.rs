//! Collaborator abstractions for model invocation and tool execution.
//!
//! The [`ModelInvoker`] and [`ToolExecutor`] traits decouple the steps from the
//! actual provider and tool backends. Both take the chain by reference and
//! return an updated copy, leaving the caller's value untouched on failure.
//! Tests use scripted collaborators or plain closures.

use crate::core::error::{InvocationError, ToolExecutionError};

/// Abstraction over model backends.
pub trait ModelInvoker<C> {
    /// Ask the model for its next response and return the chain with it appended.
    ///
    /// Implementations must not touch the embedded mode state; the run counter
    /// is owned by the invoke-model step.
    fn invoke(&self, chain: &C) -> Result<C, InvocationError>;
}

/// Abstraction over tool backends.
pub trait ToolExecutor<C> {
    /// Execute every pending tool call and return the chain with the results appended.
    ///
    /// Individual tool failures belong in the returned chain as error results.
    /// `Err` is reserved for failures that make continuing pointless.
    fn execute(&self, chain: &C) -> Result<C, ToolExecutionError>;
}

impl<C, F> ModelInvoker<C> for F
where
    F: Fn(&C) -> Result<C, InvocationError>,
{
    fn invoke(&self, chain: &C) -> Result<C, InvocationError> {
        self(chain)
    }
}

impl<C, F> ToolExecutor<C> for F
where
    F: Fn(&C) -> Result<C, ToolExecutionError>,
{
    fn execute(&self, chain: &C) -> Result<C, ToolExecutionError> {
        self(chain)
    }
}

/// Tool executor for chains that never request tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTools;

impl<C: Clone> ToolExecutor<C> for NoTools {
    fn execute(&self, chain: &C) -> Result<C, ToolExecutionError> {
        Ok(chain.clone())
    }
}
