//! Wallet Persona - portfolio analysis and persona classification CLI
//!
//! Runs the full pipeline against a JSON fixture file holding positions,
//! transfer history, and prices for the analyzed addresses.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use wallet_persona::cli::commands;
use wallet_persona::config::AnalyzerConfig;

/// Wallet persona analyzer - portfolio reconciliation and classification
#[derive(Parser)]
#[command(name = "wallet-persona")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "persona.toml")]
    config: String,

    /// Path to the JSON fixture file backing the data sources
    #[arg(short, long, default_value = "fixtures.json")]
    fixture: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a wallet's portfolio and print the snapshot
    Analyze {
        /// Wallet address
        address: String,
    },

    /// Classify a wallet's persona with full scoring detail
    Classify {
        /// Wallet address
        address: String,
    },

    /// Classify many wallets and print a distribution report
    Batch {
        /// Wallet addresses
        addresses: Vec<String>,

        /// File with one address per line (# comments allowed)
        #[arg(long)]
        file: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wallet_persona=info".parse().unwrap()),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let config = match AnalyzerConfig::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Analyze { address } => commands::analyze(&config, &cli.fixture, &address).await,
        Commands::Classify { address } => commands::classify(&config, &cli.fixture, &address).await,
        Commands::Batch { addresses, file } => {
            commands::batch(&config, &cli.fixture, addresses, file.as_deref()).await
        }
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
