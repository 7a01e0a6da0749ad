//! Board Server - Main
//!
//! Board and todo REST backend with JWT authentication.

use anyhow::Result;
use board_server::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "board-server")]
#[command(about = "Board and todo REST server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config.yaml and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the YAML config file
        #[arg(short, long, env = "BOARD_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Load and validate the configuration, then exit
    CheckConfig {
        /// Path to the YAML config file
        #[arg(short, long, env = "BOARD_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,board_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let mut config = Config::from_yaml_and_env(config.as_deref())?;
            if let Some(port) = port {
                config.server_port = port;
            }
            board_server::start_server(config).await
        }
        Commands::CheckConfig { config } => {
            let config = Config::from_yaml_and_env(config.as_deref())?;
            tracing::info!("Configuration OK: {:?}", config);
            Ok(())
        }
    }
}
