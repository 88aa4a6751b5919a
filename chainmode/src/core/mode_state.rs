//! Run bookkeeping embedded in every chain driven by a mode.

use serde::{Deserialize, Serialize};

use crate::core::chain::ChainState;

/// Per-chain mode bookkeeping.
///
/// `run_count` counts completed model invocations. It is only advanced by the
/// invoke-model step and is never reset by a mode, so it survives pause/resume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    pub run_count: u32,
}

/// Mode state of `chain`, created with defaults when absent.
pub fn mode_state_mut<C: ChainState>(chain: &mut C) -> &mut ModeState {
    chain.mode_state_slot().get_or_insert_with(ModeState::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chain::Chain;

    #[test]
    fn missing_state_counts_as_zero() {
        assert_eq!(Chain::default().run_count(), 0);
    }

    #[test]
    fn mode_state_mut_creates_lazily_and_keeps_existing() {
        let mut chain = Chain::default();
        mode_state_mut(&mut chain).run_count = 4;
        assert_eq!(chain.mode_state, Some(ModeState { run_count: 4 }));

        mode_state_mut(&mut chain);
        assert_eq!(chain.run_count(), 4);
    }
}
