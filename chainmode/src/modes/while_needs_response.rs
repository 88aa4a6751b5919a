//! Loop for as long as the model still owes a response.

use tracing::instrument;

use crate::collaborators::{ModelInvoker, ToolExecutor};
use crate::core::chain::ChainState;
use crate::core::options::ModeOptions;
use crate::core::pipeline::{PipelineValue, RunResult};
use crate::modes::{Runtime, enter, note_ceiling};
use crate::steps;

const NAME: &str = "while-needs-response";

/// Invoke the model and run its tools until the chain needs no further
/// response, the run limit is hit, or a collaborator fails.
#[instrument(skip_all, fields(mode = NAME, max_runs = ?options.max_runs))]
pub fn run_while_needs_response<C, M, T>(
    chain: C,
    options: &ModeOptions,
    runtime: &mut Runtime<'_, M, T>,
) -> RunResult<C>
where
    C: ChainState,
    M: ModelInvoker<C>,
    T: ToolExecutor<C>,
{
    let limit = runtime.run_limit(options, &chain);
    let entry = enter(NAME, chain, limit);
    let result = steps::continue_or_recurse(entry, |chain| {
        let value = steps::ensure_mode_state(PipelineValue::Continue(chain));
        let value = steps::invoke_model(value, runtime.model);
        let value = steps::execute_tool_calls(value, runtime.tools);
        let value = steps::check_needs_response(value);
        let value = steps::check_max_runs(value, limit);
        runtime.report(NAME, &value);
        value
    });
    note_ceiling(NAME, &result, options, limit);
    result
}
