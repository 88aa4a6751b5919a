//! Developer CLI for replaying chains through the execution modes.
//!
//! Loads a chain file and a replay script, runs a mode with the scripted model
//! and canned tools, and writes the resulting chain back so a paused run can be
//! resumed by running the same command again.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chainmode::core::chain::ChainState;
use chainmode::core::options::ModeOptions;
use chainmode::core::pipeline::RunResult;
use chainmode::exit_codes;
use chainmode::io::chain_store::{load_chain, write_chain};
use chainmode::io::config::load_config;
use chainmode::io::replay::load_script;
use chainmode::logging;
use chainmode::modes::{BuiltinMode, Runtime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "chainmode",
    version,
    about = "Replay LLM chains through execution modes"
)]
struct Cli {
    /// Log more to stderr (-v info, -vv debug). `RUST_LOG` overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a mode over a chain file using a replay script as the model.
    Run {
        /// Chain JSON file to run.
        #[arg(long)]
        chain: PathBuf,
        /// Replay script answering model turns and tool calls.
        #[arg(long)]
        script: PathBuf,
        /// Mode to run (defaults to the configured mode).
        #[arg(long, value_enum)]
        mode: Option<BuiltinMode>,
        /// Pause once the chain's run count reaches this value.
        #[arg(long)]
        max_runs: Option<u32>,
        /// Tool that ends an until-tool-used run.
        #[arg(long)]
        tool_name: Option<String>,
        /// Allow step mode one extra round.
        #[arg(long = "continue")]
        continue_step: bool,
        /// Engine config file.
        #[arg(long, default_value = "chainmode.toml")]
        config: PathBuf,
        /// Where to write the resulting chain (defaults to --chain).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print run count and response state of a chain file.
    Show {
        #[arg(long)]
        chain: PathBuf,
    },
}

/// One-line JSON summary printed after a run.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    mode: &'a str,
    status: &'static str,
    run_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run {
            chain,
            script,
            mode,
            max_runs,
            tool_name,
            continue_step,
            config,
            out,
        } => {
            let options = ModeOptions {
                max_runs,
                tool_name,
                continue_step,
            };
            cmd_run(RunArgs {
                chain,
                script,
                mode,
                options,
                config,
                out,
            })
        }
        Command::Show { chain } => cmd_show(chain),
    }
}

struct RunArgs {
    chain: PathBuf,
    script: PathBuf,
    mode: Option<BuiltinMode>,
    options: ModeOptions,
    config: PathBuf,
    out: Option<PathBuf>,
}

fn cmd_run(args: RunArgs) -> Result<i32> {
    let cfg = load_config(&args.config)?;
    let mode = args.mode.unwrap_or(cfg.default_mode);
    check_mode_args(mode, &args.options)?;
    let chain = load_chain(&args.chain)?;
    let script = load_script(&args.script)?;
    debug!(%mode, run_ceiling = cfg.run_ceiling, "starting replay");

    let model = script.model();
    let tools = script.tool_set();
    let mut runtime = Runtime::new(&model, &tools)
        .with_run_ceiling(cfg.run_ceiling)
        .on_round(|round| {
            debug!(
                mode = round.mode,
                run_count = round.run_count,
                status = round.status.as_str(),
                "round finished"
            );
        });
    let result = runtime.run(&mode, chain, &args.options);

    let out = args.out.as_ref().unwrap_or(&args.chain);
    write_chain(out, result.chain()).with_context(|| format!("save chain {}", out.display()))?;

    let summary = summarize(mode, &result);
    println!("{}", serde_json::to_string(&summary).context("serialize summary")?);
    Ok(exit_codes::for_kind(result.kind()))
}

fn check_mode_args(mode: BuiltinMode, options: &ModeOptions) -> Result<()> {
    if mode == BuiltinMode::UntilToolUsed && options.tool_name.is_none() {
        bail!("--mode {mode} requires --tool-name");
    }
    Ok(())
}

fn summarize<'a, C: ChainState>(mode: BuiltinMode, result: &'a RunResult<C>) -> RunSummary<'a> {
    RunSummary {
        mode: mode.as_str(),
        status: result.kind().as_str(),
        run_count: result.chain().run_count(),
        extra: result.extra(),
        error: result.error().map(|err| err.to_string()),
    }
}

fn cmd_show(path: PathBuf) -> Result<i32> {
    let chain = load_chain(&path)?;
    println!("run_count: {}", chain.run_count());
    println!("messages: {}", chain.messages.len());
    println!("needs_response: {}", chain.needs_response());
    Ok(exit_codes::DONE)
}
