//! Test-only scripted collaborators and file fixtures.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::TempDir;

use crate::collaborators::{ModelInvoker, ToolExecutor};
use crate::core::chain::{Chain, Message, ToolResult};
use crate::core::error::{InvocationError, ToolExecutionError};
use crate::io::chain_store::write_chain;
use crate::io::replay::{ReplayModel, ScriptedCall, ScriptedResponse};

/// Scripted plain assistant reply.
pub fn reply(content: &str) -> ScriptedResponse {
    ScriptedResponse::Reply {
        content: content.to_string(),
        tool_calls: Vec::new(),
    }
}

/// Scripted assistant turn calling a single tool.
pub fn call(name: &str) -> ScriptedResponse {
    calls(&[name])
}

/// Scripted assistant turn calling several tools at once.
pub fn calls(names: &[&str]) -> ScriptedResponse {
    ScriptedResponse::Reply {
        content: String::new(),
        tool_calls: names
            .iter()
            .map(|name| ScriptedCall {
                name: name.to_string(),
                arguments: Value::Null,
            })
            .collect(),
    }
}

/// Scripted provider failure.
pub fn failure(message: &str) -> ScriptedResponse {
    ScriptedResponse::Error {
        error: message.to_string(),
    }
}

/// Replay model that counts its invocations.
#[derive(Debug, Default)]
pub struct CountingModel {
    inner: ReplayModel,
    calls: Cell<u32>,
}

impl CountingModel {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            inner: ReplayModel::new(responses),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl ModelInvoker<Chain> for CountingModel {
    fn invoke(&self, chain: &Chain) -> Result<Chain, InvocationError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.invoke(chain)
    }
}

/// Tool executor answering every pending call with a successful echo.
#[derive(Debug, Default)]
pub struct CountingTools {
    calls: Cell<u32>,
}

impl CountingTools {
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl ToolExecutor<Chain> for CountingTools {
    fn execute(&self, chain: &Chain) -> Result<Chain, ToolExecutionError> {
        self.calls.set(self.calls.get() + 1);
        let results = chain
            .pending_tool_calls()
            .iter()
            .map(|call| ToolResult {
                call_id: call.call_id.clone(),
                name: call.name.clone(),
                content: format!("{} ok", call.name),
                is_error: false,
            })
            .collect();
        Ok(chain.clone().with_message(Message::tool_round(results)))
    }
}

/// Temporary directory holding chain, script and config files.
pub struct TestFiles {
    dir: TempDir,
}

impl TestFiles {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create tempdir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `chain` to `chain.json` and return its path.
    pub fn write_chain(&self, chain: &Chain) -> Result<PathBuf> {
        let path = self.path().join("chain.json");
        write_chain(&path, chain)?;
        Ok(path)
    }

    /// Write a raw replay script to `script.json` and return its path.
    pub fn write_script(&self, raw: &str) -> Result<PathBuf> {
        self.write_file("script.json", raw)
    }

    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
