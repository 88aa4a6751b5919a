//! Per-invocation mode options.

use serde::{Deserialize, Serialize};

/// Caller-supplied settings for a single mode invocation.
///
/// Which keys matter depends on the mode: `tool_name` is read by
/// until-tool-used, `continue_step` by step mode, `max_runs` by all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeOptions {
    /// Pause once the chain's run count reaches this many model invocations.
    pub max_runs: Option<u32>,
    /// Tool whose invocation ends an until-tool-used run.
    pub tool_name: Option<String>,
    /// Let step mode run one extra round when a response is still needed.
    #[serde(rename = "continue")]
    pub continue_step: bool,
}

impl ModeOptions {
    pub fn with_max_runs(mut self, max_runs: u32) -> Self {
        self.max_runs = Some(max_runs);
        self
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_continue(mut self, continue_step: bool) -> Self {
        self.continue_step = continue_step;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continue_key_maps_to_continue_step() {
        let options: ModeOptions =
            serde_json::from_str(r#"{"continue": true, "max_runs": 3}"#).expect("parse");
        assert_eq!(options, ModeOptions::default().with_max_runs(3).with_continue(true));
    }
}
