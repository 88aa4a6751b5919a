//! Loop until a plain reply or a tool round without errors.

use tracing::instrument;

use crate::collaborators::{ModelInvoker, ToolExecutor};
use crate::core::chain::ChainState;
use crate::core::options::ModeOptions;
use crate::core::pipeline::{PipelineValue, RunResult};
use crate::modes::{Runtime, enter, note_ceiling};
use crate::steps;

const NAME: &str = "until-success";

/// Keep invoking the model until it either answers without tools or a tool
/// round comes back with every call succeeding. Failed tool results are left
/// in the chain for the model to react to on the next round.
#[instrument(skip_all, fields(mode = NAME, max_runs = ?options.max_runs))]
pub fn run_until_success<C, M, T>(
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
        let value = steps::decide_done_on_response(value);
        let value = steps::check_max_runs(value, limit);
        runtime.report(NAME, &value);
        value
    });
    note_ceiling(NAME, &result, options, limit);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chain::{Chain, Message};
    use crate::core::error::ModeError;
    use crate::core::pipeline::ValueKind;
    use crate::test_support::{CountingModel, call, reply};
    use crate::tools::{ToolFailure, ToolSet};

    fn start() -> Chain {
        Chain::new(vec![Message::user("file the report")])
    }

    #[test]
    fn retries_after_a_failed_tool_round() {
        let model = CountingModel::new(vec![call("submit"), call("submit_v2"), reply("unused")]);
        let tools = ToolSet::new()
            .register("submit", |_| Err(ToolFailure::Recoverable("missing title".to_string())))
            .register("submit_v2", |_| Ok("filed".to_string()));
        let mut runtime = Runtime::new(&model, &tools);

        let result = run_until_success(start(), &ModeOptions::default(), &mut runtime);

        assert_eq!(result.kind(), ValueKind::Done);
        assert_eq!(model.calls(), 2);
        let results = result.chain().last_tool_results().expect("tool round");
        assert_eq!(results[0].content, "filed");
    }

    #[test]
    fn plain_reply_counts_as_success() {
        let model = CountingModel::new(vec![reply("nothing to file")]);
        let tools = ToolSet::new();
        let mut runtime = Runtime::new(&model, &tools);

        let result = run_until_success(start(), &ModeOptions::default(), &mut runtime);

        assert_eq!(result.kind(), ValueKind::Done);
        assert_eq!(result.chain().run_count(), 1);
    }

    #[test]
    fn keeps_failing_until_max_runs() {
        let model = CountingModel::new(vec![call("submit"), call("submit"), call("submit")]);
        let tools = ToolSet::new()
            .register("submit", |_| Err(ToolFailure::Recoverable("still wrong".to_string())));
        let mut runtime = Runtime::new(&model, &tools);

        let result =
            run_until_success(start(), &ModeOptions::default().with_max_runs(2), &mut runtime);

        assert_eq!(result.kind(), ValueKind::Paused);
        assert_eq!(model.calls(), 2);
    }

    #[test]
    fn fatal_tool_failure_fails_the_run() {
        let model = CountingModel::new(vec![call("shell")]);
        let tools = ToolSet::new()
            .register("shell", |_| Err(ToolFailure::Fatal("sandbox gone".to_string())));
        let mut runtime = Runtime::new(&model, &tools);

        let result = run_until_success(start(), &ModeOptions::default(), &mut runtime);

        assert!(matches!(result.error(), Some(ModeError::ToolExecution(_))));
        assert!(result.chain().has_pending_tool_calls());
    }
}
