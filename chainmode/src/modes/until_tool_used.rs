//! Loop until a named tool has been called.

use tracing::{instrument, warn};

use crate::collaborators::{ModelInvoker, ToolExecutor};
use crate::core::chain::ChainState;
use crate::core::error::OptionsError;
use crate::core::options::ModeOptions;
use crate::core::pipeline::{PipelineValue, RunResult};
use crate::modes::{Runtime, enter, note_ceiling};
use crate::steps;

const NAME: &str = "until-tool-used";

/// Keep invoking the model until `options.tool_name` shows up in a tool
/// round. Finishes with [`RunResult::DoneWithExtra`] carrying the tool name.
///
/// Fails without invoking the model when no tool name was given.
#[instrument(skip_all, fields(mode = NAME, tool = ?options.tool_name, max_runs = ?options.max_runs))]
pub fn run_until_tool_used<C, M, T>(
    chain: C,
    options: &ModeOptions,
    runtime: &mut Runtime<'_, M, T>,
) -> RunResult<C>
where
    C: ChainState,
    M: ModelInvoker<C>,
    T: ToolExecutor<C>,
{
    let Some(tool_name) = options.tool_name.as_deref() else {
        warn!("until-tool-used invoked without a tool name");
        return RunResult::Failed(chain, OptionsError::MissingToolName.into());
    };
    let limit = runtime.run_limit(options, &chain);
    let entry = enter(NAME, chain, limit);
    let result = steps::continue_or_recurse(entry, |chain| {
        let value = steps::ensure_mode_state(PipelineValue::Continue(chain));
        let value = steps::invoke_model(value, runtime.model);
        let value = steps::execute_tool_calls(value, runtime.tools);
        let value = steps::check_tool_used(value, tool_name);
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
    use crate::test_support::{CountingModel, CountingTools, call, reply};

    fn start() -> Chain {
        Chain::new(vec![Message::user("research and then submit")])
    }

    fn options(max_runs: u32) -> ModeOptions {
        ModeOptions::default()
            .with_tool_name("submit")
            .with_max_runs(max_runs)
    }

    /// Verifies the run stops on the round that called the tool and reports it.
    #[test]
    fn finishes_on_the_round_that_calls_the_tool() {
        for k in 1..=4u32 {
            let mut script = vec![call("search"); (k - 1) as usize];
            script.push(call("submit"));
            script.push(reply("unused"));
            let model = CountingModel::new(script);
            let tools = CountingTools::default();
            let mut runtime = Runtime::new(&model, &tools);

            let result = run_until_tool_used(start(), &options(4), &mut runtime);

            assert_eq!(result.kind(), ValueKind::DoneWithExtra, "k={k}");
            assert_eq!(result.extra(), Some("submit"));
            assert_eq!(result.chain().run_count(), k);
            assert_eq!(model.calls(), k);
        }
    }

    #[test]
    fn pauses_when_the_tool_is_never_called() {
        let model = CountingModel::new(vec![call("search"); 5]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools);

        let result = run_until_tool_used(start(), &options(3), &mut runtime);

        assert_eq!(result.kind(), ValueKind::Paused);
        assert_eq!(result.chain().run_count(), 3);
    }

    #[test]
    fn plain_replies_do_not_end_the_run() {
        let model = CountingModel::new(vec![reply("let me think"), call("submit")]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools);

        let result = run_until_tool_used(start(), &options(5), &mut runtime);

        assert_eq!(result.extra(), Some("submit"));
        assert_eq!(model.calls(), 2);
    }

    #[test]
    fn missing_tool_name_fails_before_invoking() {
        let model = CountingModel::new(vec![call("submit")]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools);

        let result = run_until_tool_used(start(), &ModeOptions::default(), &mut runtime);

        assert_eq!(
            result.error(),
            Some(&ModeError::Options(OptionsError::MissingToolName))
        );
        assert_eq!(model.calls(), 0);
    }
}
