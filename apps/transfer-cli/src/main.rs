//! Waltz transfer CLI entry point.
//!
//! Runs one transfer session over a selection file and prints progress
//! until the session ends. Ctrl-C cancels the session.

mod config;
mod render;
mod selection;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use waltz_connection::{WsConnector, announce_url_for};
use waltz_transfer::{ProgressView, SessionHandle, SessionState, TransferController};

use crate::config::CliConfig;
use crate::render::{Format, TerminalSink};

#[derive(Parser, Debug)]
#[command(name = "waltz-transfer", version, about = "Transfer playlists to a Waltz server")]
struct Cli {
    /// JSON file with the selected playlists.
    selection: PathBuf,

    /// Configuration file (defaults to the platform config location).
    #[arg(long)]
    config: Option<PathBuf>,

    /// WebSocket endpoint, overriding the configuration.
    #[arg(long)]
    endpoint: Option<String>,

    /// Send the selection inside the start command.
    #[arg(long)]
    embed_selection: bool,

    /// POST the selection to this URL before connecting.
    #[arg(long, conflicts_with = "announce")]
    announce_url: Option<String>,

    /// POST the selection to the endpoint's `/transfer` URL before connecting.
    #[arg(long)]
    announce: bool,

    /// Print progress as JSON lines.
    #[arg(long)]
    json: bool,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    fn apply(&self, mut config: CliConfig) -> anyhow::Result<CliConfig> {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.embed_selection {
            config.embed_selection = true;
        }
        if let Some(url) = &self.announce_url {
            config.announce_url = Some(url.clone());
        } else if self.announce {
            match announce_url_for(&config.endpoint) {
                Some(url) => config.announce_url = Some(url),
                None => bail!("cannot derive an announce URL from {}", config.endpoint),
            }
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "info,waltz=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting waltz transfer");

    let config = cli.apply(CliConfig::load(cli.config.as_deref())?)?;
    let items = selection::load(&cli.selection)?;
    tracing::info!(
        endpoint = %config.endpoint,
        items = items.len(),
        embed = config.embed_selection,
        "selection loaded"
    );

    let format = if cli.json { Format::Json } else { Format::Text };
    let connector = WsConnector::new().context("failed to build HTTP client")?;
    let controller = TransferController::new(
        config.session_config(),
        Arc::new(connector),
        Arc::new(TerminalSink::new(format)),
    );

    let handle = controller.start(items)?;
    let view = tokio::select! {
        view = handle.wait() => view,
        signal = tokio::signal::ctrl_c() => on_interrupt(&controller, &handle, signal).await,
    };
    controller.shutdown();

    match view.state {
        SessionState::Finished => Ok(ExitCode::SUCCESS),
        _ => {
            if let Some(message) = &view.terminal_message {
                eprintln!("transfer failed: {message}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Cancels the session on Ctrl-C. If the handler could not be installed
/// the session keeps running to completion.
async fn on_interrupt(
    controller: &TransferController,
    handle: &SessionHandle,
    signal: std::io::Result<()>,
) -> ProgressView {
    match signal {
        Ok(()) => {
            tracing::info!(session = %handle.id(), "interrupted, cancelling");
            controller.cancel(handle);
        }
        Err(e) => tracing::warn!(error = %e, "failed to listen for ctrl-c"),
    }
    handle.wait().await
}
