//! Single round, with an opt-in second one.

use tracing::instrument;

use crate::collaborators::{ModelInvoker, ToolExecutor};
use crate::core::chain::ChainState;
use crate::core::options::ModeOptions;
use crate::core::pipeline::{PipelineValue, RunResult};
use crate::modes::{Runtime, enter, note_ceiling};
use crate::steps;

const NAME: &str = "step";

/// Run one model round (invoke plus tools) and hand control back.
///
/// A chain that still needs a response comes back `Paused`; one that does not
/// comes back `Done`. With `options.continue_step` set, a chain that still
/// needs a response gets exactly one more round, subject to the run limit.
#[instrument(skip_all, fields(mode = NAME, continue_step = options.continue_step))]
pub fn run_step<C, M, T>(
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
    let rounds_allowed = if options.continue_step { 2 } else { 1 };
    let mut rounds = 0;
    let entry = enter(NAME, chain, limit);
    let result = steps::continue_or_recurse(entry, |chain| {
        rounds += 1;
        let value = steps::ensure_mode_state(PipelineValue::Continue(chain));
        let value = steps::invoke_model(value, runtime.model);
        let value = steps::execute_tool_calls(value, runtime.tools);
        let value = steps::check_needs_response(value);
        let value = if rounds < rounds_allowed {
            steps::check_max_runs(value, limit)
        } else {
            steps::pause_pending(value)
        };
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
    use crate::core::mode_state::ModeState;
    use crate::core::pipeline::ValueKind;
    use crate::test_support::{CountingModel, CountingTools, call, reply};

    fn start() -> Chain {
        Chain::new(vec![Message::user("plan the trip")])
    }

    #[test]
    fn single_round_pauses_when_a_response_is_still_needed() {
        let model = CountingModel::new(vec![call("search"), call("search"), reply("done")]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools);

        let result = run_step(start(), &ModeOptions::default(), &mut runtime);

        assert_eq!(result.kind(), ValueKind::Paused);
        assert_eq!(model.calls(), 1);
        assert_eq!(tools.calls(), 1);
        assert_eq!(result.chain().run_count(), 1);
    }

    #[test]
    fn single_round_finishes_on_a_plain_reply() {
        let model = CountingModel::new(vec![reply("sure")]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools);

        let result = run_step(start(), &ModeOptions::default(), &mut runtime);

        assert_eq!(result.kind(), ValueKind::Done);
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn continue_allows_exactly_one_extra_round() {
        let model = CountingModel::new(vec![call("a"), call("b"), call("c"), reply("done")]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools);

        let result = run_step(start(), &ModeOptions::default().with_continue(true), &mut runtime);

        assert_eq!(result.kind(), ValueKind::Paused);
        assert_eq!(model.calls(), 2);
        assert_eq!(result.chain().run_count(), 2);
    }

    #[test]
    fn continue_respects_max_runs() {
        let model = CountingModel::new(vec![call("a"), call("b")]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools);
        let options = ModeOptions::default().with_continue(true).with_max_runs(1);

        let result = run_step(start(), &options, &mut runtime);

        assert_eq!(result.kind(), ValueKind::Paused);
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn stepping_again_resumes_the_run_count() {
        let model = CountingModel::new(vec![call("a"), call("b"), reply("done")]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools);
        let options = ModeOptions::default();

        let mut chain = start();
        let mut kinds = Vec::new();
        for _ in 0..3 {
            let result = run_step(chain, &options, &mut runtime);
            kinds.push(result.kind());
            chain = result.into_chain();
        }

        assert_eq!(kinds, vec![ValueKind::Paused, ValueKind::Paused, ValueKind::Done]);
        assert_eq!(chain.run_count(), 3);
    }

    #[test]
    fn long_chains_still_step_under_the_run_ceiling() {
        let model = CountingModel::new(vec![call("a"), call("b")]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools).with_run_ceiling(50);
        let mut chain = start();
        chain.mode_state = Some(ModeState { run_count: 50 });

        let result = run_step(chain, &ModeOptions::default(), &mut runtime);

        assert_eq!(result.kind(), ValueKind::Paused);
        assert_eq!(model.calls(), 1);
        assert_eq!(result.chain().run_count(), 51);
    }

    #[test]
    fn exhausted_run_count_fails_without_invoking() {
        let model = CountingModel::new(vec![call("a")]);
        let tools = CountingTools::default();
        let mut runtime = Runtime::new(&model, &tools);
        let mut chain = start();
        chain.mode_state = Some(ModeState { run_count: u32::MAX });

        let result = run_step(chain, &ModeOptions::default(), &mut runtime);

        assert_eq!(result.kind(), ValueKind::Failed);
        assert_eq!(
            result.error(),
            Some(&ModeError::RunCountOverflow { run_count: u32::MAX })
        );
        assert_eq!(model.calls(), 0);
    }
}
