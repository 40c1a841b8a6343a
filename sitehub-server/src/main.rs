//! Sitehub Server Binary

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use sitehub_config::{ConfigLoader, SitehubConfig};
use sitehub_server::{logging::init_logging, Server};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Print a sample configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", SitehubConfig::generate_sample());
        return Ok(());
    }

    let mut config = ConfigLoader::new().load(cli.config.as_ref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_logging(&config.logging)?;

    let server = Server::new(config).await?;
    server.start().await
}
