//! tokmeter CLI binary.
//!
//! Count tokens for LLM payloads.
//!
//! # Commands
//!
//! - `count` - Count tokens in text via the remote or local backend
//! - `models` - List model identifiers known to the remote provider

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokmeter::{
    artifact::HttpFetcher,
    config::{Config, DEFAULT_MODEL},
    dispatch::{Backend, CountRequest, Dispatcher},
    local::HfTokenizerBackend,
    remote::{AnthropicClient, RemoteApi},
    CountError, VERSION,
};

#[derive(Parser)]
#[command(name = "tokmeter")]
#[command(version = VERSION)]
#[command(about = "Token counting for LLM payloads", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count tokens in text
    Count {
        /// Text input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Model name
        #[arg(short, long, default_value = DEFAULT_MODEL)]
        model: String,

        /// Backend: remote, local (default: inferred from model name)
        #[arg(short, long)]
        backend: Option<Backend>,

        /// System prompt included in the remote payload
        #[arg(short, long)]
        system: Option<String>,

        /// Path to a local tokenizer artifact (local backend only)
        #[arg(long)]
        spm_model: Option<PathBuf>,
    },

    /// List model identifiers known to the remote provider
    Models,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        if let Some(count_err) = err.downcast_ref::<CountError>() {
            let suggestions = count_err.suggestions();
            if !suggestions.is_empty() {
                // One line, comma separated, so callers can grep it easily.
                eprintln!("known models: {}", suggestions.join(", "));
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config)?;

    match cli.command {
        Commands::Count {
            input,
            file,
            model,
            backend,
            system,
            spm_model,
        } => cmd_count(config, input, file, model, backend, system, spm_model).await,
        Commands::Models => cmd_models(config).await,
    }
}

async fn cmd_count(
    config: Config,
    input: Option<String>,
    file: Option<PathBuf>,
    model: String,
    backend: Option<Backend>,
    system: Option<String>,
    spm_model: Option<PathBuf>,
) -> anyhow::Result<()> {
    let text = read_input(input, file)?;
    let backend = backend.unwrap_or_else(|| Backend::infer(&model));

    let remote = build_remote(&config)?;
    let fetcher = HttpFetcher::new(Duration::from_secs(config.artifact.timeout_secs))?;

    let mut request = CountRequest::new(text, model);
    if let Some(system) = system {
        request = request.with_system(system);
    }
    if let Some(path) = spm_model {
        request = request.with_artifact_path(path);
    }

    let dispatcher = Dispatcher::new(remote, fetcher, Some(HfTokenizerBackend), config.artifact);
    let result = dispatcher.run(&request, backend).await?;

    // Bare count, trailing newline.
    println!("{}", result.tokens);
    Ok(())
}

async fn cmd_models(config: Config) -> anyhow::Result<()> {
    let client = build_remote(&config)?.ok_or_else(|| {
        CountError::MissingCredential("set ANTHROPIC_API_KEY to list models".to_string())
    })?;

    let mut ids: Vec<String> = client
        .list_models()
        .await
        .map_err(|e| anyhow::anyhow!("failed to list models: {e:?}"))?
        .into_iter()
        .map(|m| m.id)
        .filter(|id| id.starts_with("claude"))
        .collect();
    ids.sort();

    for id in ids {
        println!("{id}");
    }
    Ok(())
}

/// Build the remote client when a credential is configured.
///
/// Absence of a credential is not an error here; the dispatcher classifies
/// it if and only if the remote backend is actually selected.
fn build_remote(config: &Config) -> anyhow::Result<Option<AnthropicClient>> {
    let Some(key) = config.remote.api_key.as_deref() else {
        return Ok(None);
    };
    let client = AnthropicClient::new(key, Duration::from_secs(config.remote.timeout_secs))?
        .with_base_url(config.remote.base_url.clone());
    Ok(Some(client))
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    match input.as_deref() {
        Some("-") | None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
        Some(text) => Ok(text.to_string()),
    }
}
