//! lazycommit - CLI entry point.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use lazycommit::SystemRunner;
use lazycommit::commit::generate_commit_message;
use lazycommit::config::load_settings;
use lazycommit::llm::check_llm_installed;

/// Generate a commit message for staged changes using an LLM.
#[derive(Parser, Debug)]
#[command(name = "lazycommit")]
#[command(about = "Generate a commit message for staged changes using an LLM")]
#[command(version)]
struct Cli {
    /// Extra context for the model (e.g. why the change was made)
    context: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(cli: &Cli) {
    // RUST_LOG takes precedence; the flags pick the fallback level.
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(filter)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{e:?}");
            eprintln!("\x1b[0;31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Step 1: Check prerequisites
    check_llm_installed()?;

    // Step 2: Resolve configuration (never fatal)
    let settings = load_settings();

    // Step 3: Generate from the current directory
    let root = std::env::current_dir().context("Failed to determine current directory")?;
    let runner = SystemRunner::new(&root);

    generate_commit_message(
        &runner,
        &root,
        &settings,
        cli.context.as_deref().unwrap_or_default(),
    )
    .await?;

    Ok(())
}
