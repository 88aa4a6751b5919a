//! Deterministic, pure types shared by the steps and modes.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod chain;
pub mod error;
pub mod mode_state;
pub mod options;
pub mod pipeline;
