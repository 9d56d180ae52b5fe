//! filerelay Server Binary
//!
//! Receives files into a storage directory until interrupted.

use clap::Parser;
use filerelay::{Config, Server, ServerExit, ShutdownToken};
use tracing_subscriber::{fmt, EnvFilter};

/// filerelay Server
#[derive(Parser, Debug)]
#[command(name = "filerelay-server")]
#[command(about = "Receive files over TCP into a storage directory")]
#[command(version)]
struct Args {
    /// <host> <port> <storage directory>
    #[arg(value_name = "ARGS", num_args = 0..)]
    args: Vec<String>,

    /// Idle accept poll interval in milliseconds
    #[arg(long, default_value = "50")]
    poll_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,filerelay=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("filerelay server v{}", filerelay::VERSION);

    let config = Config::builder()
        .accept_poll_interval_ms(args.poll_ms)
        .install_signal_handler(true)
        .build();

    let mut server = Server::new(args.args, config, ShutdownToken::new());
    match server.run() {
        ServerExit::Shutdown => tracing::info!("Server stopped"),
        ServerExit::Fatal(_) => std::process::exit(1),
    }
}
