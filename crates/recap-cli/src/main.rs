//! Recap CLI - extract structured meeting notes from the command line.

use anyhow::Context;
use clap::Parser;
use recap_cli::commands;
use recap_cli::{Cli, Command, Config, Formatter};
use recap_store::SqliteStore;
use std::fs;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::path().and_then(|path| Config::load_or_init(&path)),
    }
    .context("Failed to load configuration")?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let db_path = config.database_path(cli.db)?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    debug!("Using database {}", db_path.display());
    let mut store = SqliteStore::new(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match cli.command {
        Command::Ingest(args) => {
            commands::execute_ingest(args, &mut store, &formatter)?;
        }
        Command::Extract(args) => {
            commands::execute_extract(args, store, &config.extractor, &formatter).await?;
        }
        Command::Status(args) => {
            commands::execute_status(args, &store, &formatter)?;
        }
        Command::Items(args) => {
            commands::execute_items(args, &store, &formatter)?;
        }
        Command::Edit(args) => {
            commands::execute_edit(args, &mut store, &formatter)?;
        }
        Command::History(args) => {
            commands::execute_history(args, &store, &formatter)?;
        }
        Command::Jobs(args) => {
            commands::execute_jobs(args, &store, &formatter)?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
