//! Values flowing between steps and the terminal results returned by modes.

use serde::Serialize;

use crate::core::error::ModeError;

/// A value passed from one step to the next.
///
/// Only `Continue` is acted upon by a step. Every other variant is terminal and
/// must be handed through untouched until the pipeline ends.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineValue<C> {
    Continue(C),
    Done(C),
    DoneWithExtra(C, String),
    Paused(C),
    Failed(C, ModeError),
}

/// Variant name of a [`PipelineValue`] or [`RunResult`], for logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Continue,
    Done,
    DoneWithExtra,
    Paused,
    Failed,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Continue => "continue",
            ValueKind::Done => "done",
            ValueKind::DoneWithExtra => "done_with_extra",
            ValueKind::Paused => "paused",
            ValueKind::Failed => "failed",
        }
    }
}

impl<C> PipelineValue<C> {
    pub fn kind(&self) -> ValueKind {
        match self {
            PipelineValue::Continue(_) => ValueKind::Continue,
            PipelineValue::Done(_) => ValueKind::Done,
            PipelineValue::DoneWithExtra(..) => ValueKind::DoneWithExtra,
            PipelineValue::Paused(_) => ValueKind::Paused,
            PipelineValue::Failed(..) => ValueKind::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineValue::Continue(_))
    }

    pub fn chain(&self) -> &C {
        match self {
            PipelineValue::Continue(chain)
            | PipelineValue::Done(chain)
            | PipelineValue::DoneWithExtra(chain, _)
            | PipelineValue::Paused(chain)
            | PipelineValue::Failed(chain, _) => chain,
        }
    }

    /// Split into a terminal result, or give the chain back when still running.
    pub fn into_result(self) -> Result<RunResult<C>, C> {
        match self {
            PipelineValue::Continue(chain) => Err(chain),
            PipelineValue::Done(chain) => Ok(RunResult::Done(chain)),
            PipelineValue::DoneWithExtra(chain, extra) => Ok(RunResult::DoneWithExtra(chain, extra)),
            PipelineValue::Paused(chain) => Ok(RunResult::Paused(chain)),
            PipelineValue::Failed(chain, reason) => Ok(RunResult::Failed(chain, reason)),
        }
    }
}

/// Terminal outcome of a mode invocation.
///
/// `Paused` means the chain can be handed back to the same mode to resume.
#[derive(Debug, Clone, PartialEq)]
pub enum RunResult<C> {
    Done(C),
    DoneWithExtra(C, String),
    Paused(C),
    Failed(C, ModeError),
}

impl<C> RunResult<C> {
    pub fn kind(&self) -> ValueKind {
        match self {
            RunResult::Done(_) => ValueKind::Done,
            RunResult::DoneWithExtra(..) => ValueKind::DoneWithExtra,
            RunResult::Paused(_) => ValueKind::Paused,
            RunResult::Failed(..) => ValueKind::Failed,
        }
    }

    pub fn chain(&self) -> &C {
        match self {
            RunResult::Done(chain)
            | RunResult::DoneWithExtra(chain, _)
            | RunResult::Paused(chain)
            | RunResult::Failed(chain, _) => chain,
        }
    }

    pub fn into_chain(self) -> C {
        match self {
            RunResult::Done(chain)
            | RunResult::DoneWithExtra(chain, _)
            | RunResult::Paused(chain)
            | RunResult::Failed(chain, _) => chain,
        }
    }

    pub fn extra(&self) -> Option<&str> {
        match self {
            RunResult::DoneWithExtra(_, extra) => Some(extra),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ModeError> {
        match self {
            RunResult::Failed(_, reason) => Some(reason),
            _ => None,
        }
    }
}

impl<C> From<RunResult<C>> for PipelineValue<C> {
    fn from(result: RunResult<C>) -> Self {
        match result {
            RunResult::Done(chain) => PipelineValue::Done(chain),
            RunResult::DoneWithExtra(chain, extra) => PipelineValue::DoneWithExtra(chain, extra),
            RunResult::Paused(chain) => PipelineValue::Paused(chain),
            RunResult::Failed(chain, reason) => PipelineValue::Failed(chain, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::InvocationError;

    #[test]
    fn continue_gives_the_chain_back() {
        let value = PipelineValue::Continue(7u8);
        assert!(!value.is_terminal());
        assert_eq!(value.into_result(), Err(7));
    }

    #[test]
    fn terminal_values_keep_their_payload() {
        let failed = PipelineValue::Failed(1u8, InvocationError::Request("down".into()).into());
        assert!(failed.is_terminal());
        let result = failed.into_result().expect("terminal");
        assert_eq!(result.kind(), ValueKind::Failed);
        assert!(result.error().is_some());

        let result = PipelineValue::DoneWithExtra(2u8, "search".to_string())
            .into_result()
            .expect("terminal");
        assert_eq!(result.extra(), Some("search"));
        assert_eq!(result.into_chain(), 2);
    }
}
