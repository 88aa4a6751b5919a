//! Name-keyed tool executor for [`Chain`].

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::collaborators::ToolExecutor;
use crate::core::chain::{Chain, Message, ToolCall, ToolResult};
use crate::core::error::ToolExecutionError;

/// How a tool handler can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFailure {
    /// The tool ran and reports an error back to the model.
    Recoverable(String),
    /// The tool layer itself is unusable; the run must stop.
    Fatal(String),
}

type Handler = Box<dyn Fn(&ToolCall) -> Result<String, ToolFailure>>;

/// Tool executor dispatching pending calls to registered handlers.
///
/// Unknown tools and recoverable handler failures are written into the chain
/// as error results. Only [`ToolFailure::Fatal`] aborts the round.
#[derive(Default)]
pub struct ToolSet {
    handlers: BTreeMap<String, Handler>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous handler.
    pub fn register<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ToolCall) -> Result<String, ToolFailure> + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    fn run_call(&self, call: &ToolCall) -> Result<ToolResult, ToolExecutionError> {
        let Some(handler) = self.handlers.get(&call.name) else {
            warn!(tool = %call.name, "model requested an unknown tool");
            return Ok(result(call, format!("unknown tool '{}'", call.name), true));
        };
        match handler(call) {
            Ok(content) => Ok(result(call, content, false)),
            Err(ToolFailure::Recoverable(message)) => {
                debug!(tool = %call.name, %message, "tool reported an error");
                Ok(result(call, message, true))
            }
            Err(ToolFailure::Fatal(message)) => Err(ToolExecutionError::new(&call.name, message)),
        }
    }
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolExecutor<Chain> for ToolSet {
    fn execute(&self, chain: &Chain) -> Result<Chain, ToolExecutionError> {
        let results = chain
            .pending_tool_calls()
            .iter()
            .map(|call| self.run_call(call))
            .collect::<Result<Vec<_>, _>>()?;
        if results.is_empty() {
            return Ok(chain.clone());
        }
        Ok(chain.clone().with_message(Message::tool_round(results)))
    }
}

fn result(call: &ToolCall, content: String, is_error: bool) -> ToolResult {
    ToolResult {
        call_id: call.call_id.clone(),
        name: call.name.clone(),
        content,
        is_error,
    }
}
