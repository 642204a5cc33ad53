use anyhow::Result;
use clap::Parser;
use folio_core::tracing::init_tracing;
use folio_daemon::{Settings, serve};
use std::path::PathBuf;
use tracing::info;

/// Folio dashboard server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let settings = Settings::load(cli.config.as_deref())?;
    init_tracing(&settings.logging)?;

    if let Some(path) = &cli.config {
        info!("Loaded configuration from: {}", path.display());
    }

    serve(settings).await?;
    Ok(())
}
