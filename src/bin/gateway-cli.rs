use std::path::PathBuf;

use clap::{Parser, Subcommand};
use photo_gateway_sdk::GatewayClient;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Send photos to the gateway and fetch the results", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a photo for processing
    Send {
        /// Image file to upload
        file: PathBuf,
        /// Processing mode forwarded to the worker
        #[arg(short, long, default_value = "0")]
        mode: String,
    },
    /// Download a processed photo
    Fetch {
        /// Output name returned by `send`
        name: String,
        /// Where to write the file (defaults to the name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = GatewayClient::new(&cli.url);

    match cli.command {
        Commands::Send { file, mode } => {
            let result = client.send_photo(&file, &mode).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Fetch { name, output } => {
            let bytes = client.fetch_photo(&name).await?;
            let target = output.unwrap_or_else(|| PathBuf::from(&name));
            tokio::fs::write(&target, &bytes).await?;
            println!("Wrote {} bytes to {}", bytes.len(), target.display());
        }
    }

    Ok(())
}
