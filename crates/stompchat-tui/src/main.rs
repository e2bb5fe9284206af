//! stompchat entry point.

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use stompchat_client::{ClientConfig, DEFAULT_ENDPOINT, Identity};
use stompchat_tui::{Runtime, TerminalDriver};
use tracing_subscriber::EnvFilter;

/// stompchat terminal client
#[derive(Parser, Debug)]
#[command(name = "stompchat")]
#[command(about = "Terminal chat client for a STOMP-over-WebSocket broker")]
#[command(version)]
struct Args {
    /// WebSocket URL of the broker
    #[arg(short, long, env = "STOMPCHAT_SERVER", default_value = DEFAULT_ENDPOINT)]
    server: String,

    /// Display name announced to the room
    #[arg(short, long, env = "STOMPCHAT_USERNAME")]
    username: String,

    /// Log level used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// File to write logs to (the terminal belongs to the UI)
    #[arg(long, default_value = "stompchat.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let log_file = File::create(&args.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let identity = Identity::new(args.username);
    let config = ClientConfig::with_endpoint(args.server);
    tracing::info!(%identity, endpoint = %config.endpoint, "starting");

    let driver = TerminalDriver::new()?;
    let runtime = Runtime::new(driver, identity, config);

    Ok(runtime.run().await?)
}
