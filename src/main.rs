#![allow(dead_code)]
mod console;
mod errors;
mod session;
mod shell;
mod storage;

use clap::Parser;
use std::fs::OpenOptions;
use std::io;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "btreeidx",
    version = VERSION,
    about = "Interactive manager for a persistent on-disk B-tree index."
)]
struct Cli {
    /// Index file to open immediately on launch.
    path: Option<String>,
    /// Destination for structured log output.
    #[arg(long, env = "BTREEIDX_LOG_FILE", default_value = "btreeidx.log")]
    log_file: String,
}

fn main() {
    let cli = Cli::parse();

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&cli.log_file)
        .expect("Failed to open log file");

    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match shell::repl::run(cli.path) {
        Ok(()) => (),
        Err(errors::Error::IOFailure(e)) if e.kind() == io::ErrorKind::Interrupted => (),
        Err(e) => println!("\nError: {}", e),
    }
}
