//! Chain files: the caller-held chain value written to disk as JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::chain::{Chain, ChainState};

/// Load a chain from disk.
pub fn load_chain(path: &Path) -> Result<Chain> {
    debug!(path = %path.display(), "loading chain");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read chain {}", path.display()))?;
    let chain: Chain = serde_json::from_str(&contents)
        .with_context(|| format!("parse chain {}", path.display()))?;
    debug!(
        messages = chain.messages.len(),
        run_count = chain.run_count(),
        "chain loaded"
    );
    Ok(chain)
}

/// Atomically write a chain to disk (temp file + rename).
pub fn write_chain(path: &Path, chain: &Chain) -> Result<()> {
    debug!(path = %path.display(), run_count = chain.run_count(), "writing chain");
    let mut buf = serde_json::to_string_pretty(chain)?;
    buf.push('\n');
    super::write_atomic(path, &buf, "json.tmp")
}
