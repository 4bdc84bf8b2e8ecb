use std::path::PathBuf;

use clap::Parser;
use log::{info, LevelFilter};
use msgboard_common::config::{DEFAULT_HOST, DEFAULT_PORT};
use msgboard_server::{InstanceGuard, Server};
use simple_logger::SimpleLogger;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Concurrent message board server", long_about = None)]
struct Args {
    #[arg(long, env = "MSGBOARD_HOST", default_value = DEFAULT_HOST)]
    address: String,

    #[arg(long, env = "MSGBOARD_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Marker file that keeps a second server from starting.
    #[arg(long, env = "MSGBOARD_LOCK_FILE")]
    lock_file: Option<PathBuf>,

    #[arg(long)]
    no_lock: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let args = Args::parse();

    let _guard = if args.no_lock {
        None
    } else {
        let path = args.lock_file.unwrap_or_else(InstanceGuard::default_path);
        Some(InstanceGuard::acquire(path)?)
    };

    let server = Server::bind(&format!("{}:{}", args.address, args.port)).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
    }

    Ok(())
}
