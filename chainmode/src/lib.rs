//! Execution-mode engine for LLM chains.
//!
//! A mode drives a chain through repeated rounds of "invoke the model, run the
//! tools it asked for, decide what happens next" until it finishes, pauses at a
//! checkpoint, or fails. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure data (chain contract, mode state, pipeline values,
//!   options, errors). No I/O.
//! - **[`steps`]**: Single-purpose pipeline steps. Terminal values pass through
//!   every step untouched.
//! - **[`modes`]**: Built-in loop policies composed from the steps, plus the
//!   [`modes::Mode`] extension point.
//! - **[`collaborators`]** and **[`tools`]**: The model and tool seams, and a
//!   name-keyed tool executor for the concrete [`core::chain::Chain`].
//! - **[`io`]**: Config, chain files and replay scripts for the CLI.

pub mod collaborators;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod modes;
pub mod steps;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
