//! filerelay Client Binary
//!
//! Sends one batch of files to a filerelay server.

use clap::Parser;
use filerelay::{Client, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// filerelay Client
#[derive(Parser, Debug)]
#[command(name = "filerelay-client")]
#[command(about = "Send files to a filerelay server")]
#[command(version)]
struct Args {
    /// <host> <port> <file1> [file2 ...]
    #[arg(value_name = "ARGS", num_args = 0..)]
    args: Vec<String>,

    /// Skip unreadable files before announcing the batch size
    #[arg(long)]
    verify: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).init();

    let config = Config::builder().verify_before_send(args.verify).build();

    let report = Client::new(args.args, config).run();
    if !report.completed() {
        std::process::exit(1);
    }
}
