//! huginn: answer a single prompt.
//!
//! Prints exactly one line on stdout. Diagnostics go to stderr and are
//! controlled with `RUST_LOG` (default: `warn`).

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use huginn::framing::{FramingConfig, frame_prompt};
use huginn::{Config, FALLBACK_TEMPLATE, Result};

/// Cached, pattern-first replies in front of an LLM.
#[derive(Parser)]
#[command(name = "huginn")]
#[command(version)]
#[command(about = "Answer a prompt from cache, quick patterns, or the model")]
struct Args {
    /// Prompt to answer (or omit to read from stdin)
    prompt: Option<String>,

    /// Path to configuration file.
    #[arg(short, long, env = "HUGINN_CONFIG")]
    config: Option<PathBuf>,

    /// Model to use (overrides the config file).
    #[arg(short, long)]
    model: Option<String>,

    /// Wrap the prompt in the persona template before answering.
    #[arg(long)]
    frame: bool,

    /// Print `{"response": ...}` instead of plain text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let json = args.json;

    match run(args).await {
        Ok(reply) => {
            print_reply(&reply, json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "huginn failed to start");
            // Callers still get their one line.
            print_reply(FALLBACK_TEMPLATE, json);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<String> {
    let config = Config::load_or_default(args.config.as_deref())?;

    let mut builder = config.builder()?;
    if let Some(model) = args.model {
        builder = builder.model(model);
    }
    let pipeline = builder.build()?;

    let input = match args.prompt {
        Some(prompt) => prompt,
        None => read_stdin()?,
    };

    let framing = match (&config.framing, args.frame) {
        (Some(framing), _) => Some(framing.clone()),
        (None, true) => Some(FramingConfig::default()),
        (None, false) => None,
    };
    let prompt = match framing {
        Some(framing) => frame_prompt(&framing.template, &input),
        None => input,
    };

    // The model loads lazily, once at most, and only if nothing cheaper answers.
    let reply = pipeline.respond(&prompt).await;
    info!(source = %reply.source, "replied");
    Ok(reply.text)
}

fn read_stdin() -> Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(huginn::HuginnError::Configuration(
            "no prompt given; pass one as an argument or pipe it on stdin".to_string(),
        ));
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .map_err(|e| huginn::HuginnError::Configuration(format!("failed to read stdin: {e}")))?;
    Ok(buf)
}

fn print_reply(text: &str, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "response": text }));
    } else {
        println!("{}", text.replace(['\r', '\n'], " "));
    }
}
