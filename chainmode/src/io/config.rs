//! Engine configuration stored as TOML (default `chainmode.toml`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::modes::BuiltinMode;

/// Engine configuration (TOML).
///
/// Missing fields default to the values below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Run limit applied when an invocation does not pass `max_runs`.
    pub run_ceiling: u32,

    /// Mode used by the CLI when `--mode` is not given.
    pub default_mode: BuiltinMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_ceiling: 50,
            default_mode: BuiltinMode::WhileNeedsResponse,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.run_ceiling == 0 {
            return Err(anyhow!("run_ceiling must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &EngineConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    super::write_atomic(path, &buf, "toml.tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("chainmode.toml");
        let cfg = EngineConfig {
            run_ceiling: 8,
            default_mode: BuiltinMode::UntilSuccess,
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("chainmode.toml");
        fs::write(&path, "default_mode = \"step\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.default_mode, BuiltinMode::Step);
        assert_eq!(cfg.run_ceiling, 50);
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("chainmode.toml");
        fs::write(&path, "run_ceiling = 0\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(err.to_string().contains("run_ceiling"));
    }
}
