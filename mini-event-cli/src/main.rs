//! mini-event
//!
//! Replays an event wiring file: creates the named targets, attaches the
//! configured listeners and relays, fires the configured events and prints
//! every returned event as JSON.

mod config;
mod scenario;

use clap::Parser;
use config::ConfigLoader;
use scenario::Scenario;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Replay event wiring scenarios
#[derive(Parser, Debug)]
#[command(name = "mini-event")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the wiring file
    #[arg(short, long, default_value = "./mini-event.toml")]
    config: PathBuf,

    /// Log every dispatch step unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    /// Pretty-print the fired events
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    tracing::info!("Starting mini-event v{}", mini_event::VERSION);

    let config = ConfigLoader::new(&args.config).load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let scenario = Scenario::build(&config)?;
    for report in scenario.replay(&config.fires)? {
        let line = if args.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{line}");
    }

    tracing::info!(fires = config.fires.len(), "Replay complete");
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr so that stdout only carries the fired events.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "trace" } else { "info,mini_event=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
