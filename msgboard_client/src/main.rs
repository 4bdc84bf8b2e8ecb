use std::process::exit;

use clap::Parser;
use colored::Colorize;
use log::LevelFilter;
use msgboard_client::{menu, Client};
use msgboard_common::config::{DEFAULT_HOST, DEFAULT_PORT, MAX_MSG_LEN};
use simple_logger::SimpleLogger;
use tokio::io::BufReader;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Interactive message board client", long_about = None)]
struct Args {
    #[arg(long, env = "MSGBOARD_HOST", default_value = DEFAULT_HOST)]
    address: String,

    #[arg(long, env = "MSGBOARD_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Longest message, in characters, the client will send.
    #[arg(long, default_value_t = MAX_MSG_LEN)]
    max_len: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()?;

    let args = Args::parse();
    let addr = format!("{}:{}", args.address, args.port);

    let client = match Client::connect(&addr).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            exit(1)
        }
    };
    println!("{}", format!("Conectado a {}", addr).green());

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    if let Err(e) = menu::run_session(client, stdin, &mut stdout, args.max_len).await {
        eprintln!("{}", format!("Error de comunicacion: {}", e).red());
        exit(1)
    }

    Ok(())
}
