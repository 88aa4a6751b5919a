//! Stable exit codes for the `chainmode` CLI.

use crate::core::pipeline::ValueKind;

/// The mode finished (`done` or `done_with_extra`), or `show` succeeded.
pub const DONE: i32 = 0;
/// Invalid input: unreadable chain, script or config, or bad arguments.
pub const INVALID: i32 = 1;
/// The run paused at a checkpoint and can be resumed.
pub const PAUSED: i32 = 2;
/// A collaborator failed the run.
pub const FAILED: i32 = 3;

/// Exit code for a finished run.
pub fn for_kind(kind: ValueKind) -> i32 {
    match kind {
        ValueKind::Done | ValueKind::DoneWithExtra => DONE,
        ValueKind::Paused | ValueKind::Continue => PAUSED,
        ValueKind::Failed => FAILED,
    }
}
