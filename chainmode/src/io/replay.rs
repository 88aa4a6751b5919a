//! Scripted model replay for exercising modes without a provider.
//!
//! A replay script lists the model's responses in order plus canned tool
//! outputs. [`ReplayModel`] picks the response by counting the assistant
//! messages already in the chain, so it holds no cursor of its own and a
//! paused chain picks up exactly where it stopped.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use jsonschema::Draft;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::collaborators::ModelInvoker;
use crate::core::chain::{Chain, Message, ToolCall};
use crate::core::error::InvocationError;
use crate::tools::{ToolFailure, ToolSet};

const REPLAY_SCRIPT_SCHEMA: &str = include_str!("../../schemas/replay_script.schema.json");

/// A tool call the scripted model will request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// One scripted model turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptedResponse {
    /// The provider rejects this turn.
    Error { error: String },
    /// The model answers, optionally asking for tools.
    Reply {
        #[serde(default)]
        content: String,
        #[serde(default)]
        tool_calls: Vec<ScriptedCall>,
    },
}

/// Canned output for a tool named in the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedTool {
    pub output: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub fatal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    pub responses: Vec<ScriptedResponse>,
    #[serde(default)]
    pub tools: BTreeMap<String, ScriptedTool>,
}

impl ReplayScript {
    pub fn model(&self) -> ReplayModel {
        ReplayModel::new(self.responses.clone())
    }

    /// Tool set answering every scripted tool with its canned output.
    pub fn tool_set(&self) -> ToolSet {
        self.tools
            .iter()
            .fold(ToolSet::new(), |set, (name, tool)| {
                let tool = tool.clone();
                set.register(name.clone(), move |_| {
                    if tool.fatal {
                        Err(ToolFailure::Fatal(tool.output.clone()))
                    } else if tool.is_error {
                        Err(ToolFailure::Recoverable(tool.output.clone()))
                    } else {
                        Ok(tool.output.clone())
                    }
                })
            })
    }
}

/// Model collaborator answering from a fixed list of responses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayModel {
    responses: Vec<ScriptedResponse>,
}

impl ReplayModel {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self { responses }
    }
}

impl ModelInvoker<Chain> for ReplayModel {
    fn invoke(&self, chain: &Chain) -> Result<Chain, InvocationError> {
        let turn = chain.assistant_turns();
        debug!(turn, "replaying scripted response");
        match self.responses.get(turn) {
            None => Err(InvocationError::Exhausted { turn }),
            Some(ScriptedResponse::Error { error }) => Err(InvocationError::Provider(error.clone())),
            Some(ScriptedResponse::Reply {
                content,
                tool_calls,
            }) => {
                let calls = tool_calls
                    .iter()
                    .enumerate()
                    .map(|(i, call)| ToolCall {
                        call_id: format!("call_{turn}_{i}"),
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    })
                    .collect();
                Ok(chain
                    .clone()
                    .with_message(Message::assistant_with_calls(content.clone(), calls)))
            }
        }
    }
}

/// Load and schema-check a replay script.
pub fn load_script(path: &Path) -> Result<ReplayScript> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_script(&raw).with_context(|| format!("load replay script {}", path.display()))
}

/// Parse a replay script after validating it against the bundled schema.
pub fn parse_script(raw: &str) -> Result<ReplayScript> {
    let instance: Value = serde_json::from_str(raw).context("parse replay script json")?;
    let schema: Value =
        serde_json::from_str(REPLAY_SCRIPT_SCHEMA).context("parse replay script schema")?;
    validate_schema(&instance, &schema)?;
    let script: ReplayScript =
        serde_json::from_value(instance).context("parse replay script as struct")?;
    debug!(
        responses = script.responses.len(),
        tools = script.tools.len(),
        "replay script loaded"
    );
    Ok(script)
}

/// Validate JSON instance against a JSON Schema (Draft 2020-12).
fn validate_schema(instance: &Value, schema: &Value) -> Result<()> {
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .context("compile json schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}
