//! The step library modes are composed from.
//!
//! Every step takes a [`PipelineValue`] and returns one. Terminal inputs are
//! handed back untouched without calling any collaborator; only `Continue`
//! values are worked on. Steps are plain functions so custom modes can mix
//! them with their own.

use tracing::{debug, warn};

use crate::collaborators::{ModelInvoker, ToolExecutor};
use crate::core::chain::ChainState;
use crate::core::error::ModeError;
use crate::core::mode_state::mode_state_mut;
use crate::core::pipeline::{PipelineValue, RunResult};

/// Make sure the chain carries a mode state. Idempotent.
pub fn ensure_mode_state<C: ChainState>(value: PipelineValue<C>) -> PipelineValue<C> {
    match value {
        PipelineValue::Continue(mut chain) => {
            mode_state_mut(&mut chain);
            PipelineValue::Continue(chain)
        }
        terminal => terminal,
    }
}

/// Ask the model for its next response and count the run.
///
/// The new run count is derived from the input chain, so a collaborator that
/// rebuilds the chain cannot reset it. A chain whose count cannot go any
/// higher fails without calling the model.
pub fn invoke_model<C, M>(value: PipelineValue<C>, model: &M) -> PipelineValue<C>
where
    C: ChainState,
    M: ModelInvoker<C>,
{
    let chain = match value {
        PipelineValue::Continue(chain) => chain,
        terminal => return terminal,
    };
    let previous = chain.run_count();
    let Some(current) = previous.checked_add(1) else {
        warn!(run_count = previous, "run count exhausted");
        return PipelineValue::Failed(chain, ModeError::RunCountOverflow { run_count: previous });
    };
    match model.invoke(&chain) {
        Ok(mut next) => {
            mode_state_mut(&mut next).run_count = current;
            debug!(run_count = current, "model invocation completed");
            PipelineValue::Continue(next)
        }
        Err(err) => {
            warn!(run_count = previous, error = %err, "model invocation failed");
            PipelineValue::Failed(chain, err.into())
        }
    }
}

/// Run the tool calls requested by the latest model response.
///
/// Nothing pending means nothing to do and the collaborator is not called.
pub fn execute_tool_calls<C, T>(value: PipelineValue<C>, tools: &T) -> PipelineValue<C>
where
    C: ChainState,
    T: ToolExecutor<C>,
{
    let chain = match value {
        PipelineValue::Continue(chain) => chain,
        terminal => return terminal,
    };
    if !chain.has_pending_tool_calls() {
        return PipelineValue::Continue(chain);
    }
    match tools.execute(&chain) {
        Ok(next) => {
            let failed = next
                .last_tool_results()
                .map(|results| results.iter().filter(|r| r.is_error).count())
                .unwrap_or(0);
            debug!(failed, "tool round executed");
            PipelineValue::Continue(next)
        }
        Err(err) => {
            warn!(tool = %err.tool, error = %err.message, "fatal tool failure");
            PipelineValue::Failed(chain, err.into())
        }
    }
}

/// Pause once the chain has used up `max_runs` model invocations.
pub fn check_max_runs<C: ChainState>(
    value: PipelineValue<C>,
    max_runs: Option<u32>,
) -> PipelineValue<C> {
    match value {
        PipelineValue::Continue(chain) => match max_runs {
            Some(limit) if chain.run_count() >= limit => {
                debug!(run_count = chain.run_count(), limit, "run limit reached");
                PipelineValue::Paused(chain)
            }
            _ => PipelineValue::Continue(chain),
        },
        terminal => terminal,
    }
}

/// Finish with the tool's name once it shows up in the latest tool round.
///
/// A result counts whether or not the tool reported an error.
pub fn check_tool_used<C: ChainState>(value: PipelineValue<C>, tool_name: &str) -> PipelineValue<C> {
    match value {
        PipelineValue::Continue(chain) => {
            let used = chain
                .last_tool_results()
                .is_some_and(|results| results.iter().any(|r| r.name == tool_name));
            if used {
                PipelineValue::DoneWithExtra(chain, tool_name.to_string())
            } else {
                PipelineValue::Continue(chain)
            }
        }
        terminal => terminal,
    }
}

/// Finish on a plain assistant reply or on a tool round where every call succeeded.
pub fn decide_done_on_response<C: ChainState>(value: PipelineValue<C>) -> PipelineValue<C> {
    match value {
        PipelineValue::Continue(chain) => {
            let tools_succeeded = chain.last_tool_results().is_some_and(|results| {
                !results.is_empty() && results.iter().all(|r| !r.is_error)
            });
            if chain.last_is_assistant_reply() || tools_succeeded {
                PipelineValue::Done(chain)
            } else {
                PipelineValue::Continue(chain)
            }
        }
        terminal => terminal,
    }
}

/// Finish once the model no longer owes a response.
pub fn check_needs_response<C: ChainState>(value: PipelineValue<C>) -> PipelineValue<C> {
    match value {
        PipelineValue::Continue(chain) if !chain.needs_response() => PipelineValue::Done(chain),
        other => other,
    }
}

/// Turn a still-running value into a resumable checkpoint.
pub fn pause_pending<C>(value: PipelineValue<C>) -> PipelineValue<C> {
    match value {
        PipelineValue::Continue(chain) => PipelineValue::Paused(chain),
        terminal => terminal,
    }
}

/// Drive `recurse` until it yields a terminal value.
///
/// `recurse` runs one more pass of a mode's pipeline for a chain that is still
/// running. This is the only loop in a mode. It adds no depth limit of its
/// own; `max_runs` (or the configured run ceiling) is what bounds it when the
/// chain never reaches a natural end.
pub fn continue_or_recurse<C, F>(value: PipelineValue<C>, mut recurse: F) -> RunResult<C>
where
    F: FnMut(C) -> PipelineValue<C>,
{
    let mut value = value;
    loop {
        match value.into_result() {
            Ok(result) => return result,
            Err(chain) => value = recurse(chain),
        }
    }
}
