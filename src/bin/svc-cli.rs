use clap::{Parser, Subcommand};
use serde_json::Value;

use service_bootstrap::transport::{ClientError, TcpClient};

#[derive(Parser)]
#[command(name = "svc-cli")]
#[command(about = "Send messages to a service over the point-to-point transport", long_about = None)]
struct Cli {
    #[arg(short, long, env = "TRANSPORT_ADDR", default_value = "127.0.0.1:3001")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a request and print the reply
    Send {
        /// Message pattern (e.g. notification.send)
        pattern: String,
        /// JSON payload
        #[arg(default_value = "{}")]
        data: String,
    },
    /// Send an event; no reply is expected
    Emit {
        pattern: String,
        #[arg(default_value = "{}")]
        data: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut client = TcpClient::connect(&cli.addr).await?;

    match cli.command {
        Commands::Send { pattern, data } => {
            let data: Value = serde_json::from_str(&data)?;
            match client.send(&pattern, data).await {
                Ok(reply) => println!("{}", serde_json::to_string_pretty(&reply)?),
                Err(ClientError::Remote(err)) => {
                    eprintln!("Error: service rejected the request");
                    eprintln!("{}", serde_json::to_string_pretty(&err)?);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Emit { pattern, data } => {
            let data: Value = serde_json::from_str(&data)?;
            client.emit(&pattern, data).await?;
            println!("Event '{}' sent", pattern);
        }
    }

    Ok(())
}
