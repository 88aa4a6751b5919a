//! Diagnostics for mode runs, written to stderr through `tracing`.
//!
//! The library only emits events: steps log at debug, mode start/finish at
//! info, and collaborator failures or ceiling pauses at warn. Only the CLI
//! installs a subscriber. Per-round reporting for callers goes through
//! `modes::Runtime::on_round` instead and does not depend on any filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset, raised by each `-v`.
fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "warn,chainmode=info",
        _ => "warn,chainmode=debug",
    }
}

/// Install the stderr subscriber for the CLI.
///
/// `RUST_LOG` wins over `verbose` when set:
///
/// ```bash
/// RUST_LOG=chainmode::steps=debug chainmode run --chain chain.json --script script.json
/// ```
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
