//! Execution modes: fixed compositions of [`steps`](crate::steps) into a loop.
//!
//! A mode takes a chain, the caller's [`ModeOptions`] and a [`Runtime`]
//! holding the collaborators, and runs until a terminal [`RunResult`]. The four
//! built-in policies are exposed through [`BuiltinMode`]; anything else that
//! implements [`Mode`] (including a plain closure) can be run the same way.

mod step;
mod until_success;
mod until_tool_used;
mod while_needs_response;

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collaborators::{ModelInvoker, ToolExecutor};
use crate::core::chain::ChainState;
use crate::core::options::ModeOptions;
use crate::core::pipeline::{PipelineValue, RunResult, ValueKind};
use crate::steps;

pub use step::run_step;
pub use until_success::run_until_success;
pub use until_tool_used::run_until_tool_used;
pub use while_needs_response::run_while_needs_response;

/// A loop policy over the step library.
pub trait Mode<C, M, T> {
    fn run(&self, chain: C, options: &ModeOptions, runtime: &mut Runtime<'_, M, T>) -> RunResult<C>;
}

impl<C, M, T, F> Mode<C, M, T> for F
where
    F: Fn(C, &ModeOptions, &mut Runtime<'_, M, T>) -> RunResult<C>,
{
    fn run(&self, chain: C, options: &ModeOptions, runtime: &mut Runtime<'_, M, T>) -> RunResult<C> {
        self(chain, options, runtime)
    }
}

/// The built-in loop policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinMode {
    /// Keep going while the model still owes a response.
    #[default]
    WhileNeedsResponse,
    /// Stop on the first plain reply or fully successful tool round.
    UntilSuccess,
    /// One round, optionally one more when `continue` is set.
    Step,
    /// Stop once the tool named in the options has been called.
    UntilToolUsed,
}

impl BuiltinMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinMode::WhileNeedsResponse => "while-needs-response",
            BuiltinMode::UntilSuccess => "until-success",
            BuiltinMode::Step => "step",
            BuiltinMode::UntilToolUsed => "until-tool-used",
        }
    }
}

impl fmt::Display for BuiltinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            BuiltinMode::WhileNeedsResponse,
            BuiltinMode::UntilSuccess,
            BuiltinMode::Step,
            BuiltinMode::UntilToolUsed,
        ]
        .into_iter()
        .find(|mode| mode.as_str() == s)
        .ok_or_else(|| anyhow!("unknown mode '{s}'"))
    }
}

impl<C, M, T> Mode<C, M, T> for BuiltinMode
where
    C: ChainState,
    M: ModelInvoker<C>,
    T: ToolExecutor<C>,
{
    fn run(&self, chain: C, options: &ModeOptions, runtime: &mut Runtime<'_, M, T>) -> RunResult<C> {
        info!(mode = %self, max_runs = ?options.max_runs, "mode started");
        let result = match self {
            BuiltinMode::WhileNeedsResponse => run_while_needs_response(chain, options, runtime),
            BuiltinMode::UntilSuccess => run_until_success(chain, options, runtime),
            BuiltinMode::Step => run_step(chain, options, runtime),
            BuiltinMode::UntilToolUsed => run_until_tool_used(chain, options, runtime),
        };
        info!(
            mode = %self,
            status = result.kind().as_str(),
            run_count = result.chain().run_count(),
            "mode finished"
        );
        result
    }
}

/// Per-round report handed to the runtime observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub mode: &'static str,
    /// Run count after the round.
    pub run_count: u32,
    /// Where the round left the pipeline.
    pub status: ValueKind,
}

type Observer<'a> = Box<dyn FnMut(&RoundReport) + 'a>;

/// Collaborators and run-wide settings shared by every round of a mode.
pub struct Runtime<'a, M, T> {
    pub model: &'a M,
    pub tools: &'a T,
    run_ceiling: Option<u32>,
    observer: Option<Observer<'a>>,
}

impl<'a, M, T> Runtime<'a, M, T> {
    pub fn new(model: &'a M, tools: &'a T) -> Self {
        Self {
            model,
            tools,
            run_ceiling: None,
            observer: None,
        }
    }

    /// Limit applied when the caller leaves `max_runs` unset.
    pub fn with_run_ceiling(mut self, ceiling: u32) -> Self {
        self.run_ceiling = Some(ceiling);
        self
    }

    /// Call `observer` after every round.
    pub fn on_round<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&RoundReport) + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Run count at which a run starting from `chain` pauses.
    ///
    /// The caller's `max_runs` caps the chain's total run count. Without it,
    /// the run ceiling caps the invocations made from this starting point, so
    /// a long conversation can always be resumed.
    pub fn run_limit<C: ChainState>(&self, options: &ModeOptions, chain: &C) -> Option<u32> {
        options.max_runs.or_else(|| {
            self.run_ceiling
                .map(|ceiling| chain.run_count().saturating_add(ceiling))
        })
    }

    /// Run a mode against this runtime.
    pub fn run<C, P>(&mut self, mode: &P, chain: C, options: &ModeOptions) -> RunResult<C>
    where
        P: Mode<C, M, T> + ?Sized,
    {
        mode.run(chain, options, self)
    }

    /// Report a finished round to the observer, if any.
    pub fn report<C: ChainState>(&mut self, mode: &'static str, value: &PipelineValue<C>) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&RoundReport {
                mode,
                run_count: value.chain().run_count(),
                status: value.kind(),
            });
        }
    }
}

/// Shared opening of every built-in mode: create the mode state and pause
/// straight away when the chain already used up its run limit.
pub(crate) fn enter<C: ChainState>(
    mode: &'static str,
    chain: C,
    limit: Option<u32>,
) -> PipelineValue<C> {
    let value = steps::check_max_runs(steps::ensure_mode_state(PipelineValue::Continue(chain)), limit);
    if value.is_terminal() {
        info!(mode, run_count = value.chain().run_count(), "run limit already reached");
    }
    value
}

/// Warn when a pause came from the configured ceiling rather than the caller.
pub(crate) fn note_ceiling<C: ChainState>(
    mode: &'static str,
    result: &RunResult<C>,
    options: &ModeOptions,
    limit: Option<u32>,
) {
    let Some(limit) = limit else {
        return;
    };
    if options.max_runs.is_none()
        && matches!(result, RunResult::Paused(_))
        && result.chain().run_count() >= limit
    {
        warn!(mode, limit, "paused at the configured run ceiling");
    }
}
