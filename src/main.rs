//! recipe-api server binary.
//!
//! ```text
//! recipe-api [--config PATH] [serve]
//! recipe-api [--config PATH] token --user ID
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use recipe_api::auth::{PrincipalId, TokenCodec};
use recipe_api::lifecycle::{spawn_signal_handler, startup};
use recipe_api::observability::{logging, metrics};
use recipe_api::store::InMemoryPrincipalStore;
use recipe_api::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "recipe-api")]
#[command(about = "Recipe and marketplace API server", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print a bearer token for a user id
    Token {
        #[arg(short, long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = startup::resolve_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Token { user } => {
            let token = TokenCodec::new(&config.auth).issue(&PrincipalId::new(user))?;
            println!("{token}");
            Ok(())
        }
        Commands::Serve => {
            logging::init_logging(&config.observability);
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "recipe-api starting");
            match &cli.config {
                Some(path) => tracing::info!(path = %path.display(), "Configuration loaded"),
                None => tracing::warn!("No config file given, using defaults"),
            }

            if config.observability.metrics_enabled {
                // Validation guarantees the address parses.
                if let Ok(addr) = config.observability.metrics_address.parse() {
                    metrics::init_metrics(addr);
                }
            }

            let store = InMemoryPrincipalStore::new();
            let seeded = startup::seed_principals(&store, &config.principals).await?;
            tracing::info!(seeded, "Principal store ready");

            let listener = startup::bind_listener(&config).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");

            let shutdown = Shutdown::new();
            spawn_signal_handler(shutdown.clone());

            let server = HttpServer::new(config, Arc::new(store));
            server.run(listener, &shutdown).await?;

            tracing::info!("Shutdown complete");
            Ok(())
        }
    }
}
