use clap::Parser;

mod cli;
mod client;
mod error;

use cli::{Cli, Commands};
use error::CliError;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    if let Err(e) = run(args).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Cli) -> Result<(), CliError> {
    match args.command {
        Commands::Ping => {
            let body = client::json_command(&args.socket, "ping").await?;
            println!("{}", body["data"].as_str().unwrap_or("pong"));
        }
        Commands::Status => {
            let body = client::json_command(&args.socket, "status").await?;
            println!("{}", serde_json::to_string_pretty(&body["data"])?);
        }
        Commands::Raw(raw) => {
            let response = client::request(&args.socket, raw.payload.as_bytes()).await?;
            println!("{}", String::from_utf8_lossy(&response));
        }
    }
    Ok(())
}
