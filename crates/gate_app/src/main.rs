mod cli;
mod commands;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gate_core::{FileSettingsStore, GateError, logging};
use tracing::warn;

use cli::{Cli, Command};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Argument text, or all of stdin when absent.
fn input_text(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn store_error(e: GateError) -> anyhow::Error {
    warn!(category = ?e.category(), "Settings store unavailable: {e}");
    anyhow::anyhow!(e.user_message())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            None
        }
    };
    tracing::debug!("promptgate v{VERSION}");

    let store = match &cli.settings_file {
        Some(path) => FileSettingsStore::open(path),
        None => FileSettingsStore::open_default(),
    }
    .map_err(store_error)?;

    match cli.command {
        Command::Scan { text, level } => {
            let text = input_text(text)?;
            let result = commands::scan(&store, &text, level.map(Into::into)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Redact { text, level } => {
            let text = input_text(text)?;
            let result = commands::scan(&store, &text, level.map(Into::into)).await?;
            print!("{}", result.redacted_text);
        }
        Command::Settings { command } => {
            println!("{}", commands::settings(&store, command).await?);
        }
        Command::Trust { command } => {
            println!("{}", commands::trust(&store, command).await?);
        }
        Command::Watch => {
            let store = store.watch().map_err(store_error)?;
            eprintln!("Watching {}", store.path().display());
            let shutdown = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            commands::watch_settings(Arc::new(store), shutdown, |json| println!("{json}")).await?;
        }
    }

    Ok(())
}
