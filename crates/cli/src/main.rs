//! Itinera CLI — the main entry point.
//!
//! Commands:
//! - `chat`      — Interactive chat or single-message mode
//! - `products`  — List the tourism product catalog
//! - `recommend` — Query the catalog directly, no model involved

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "itinera",
    about = "Itinera — streaming Tokyo travel assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the travel assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List the product catalog
    Products,

    /// Ask the catalog for recommendations directly
    Recommend {
        /// Free-text query (e.g. "晴空塔 夜景")
        query: String,

        /// Budget ceiling in yen
        #[arg(short, long)]
        budget: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Products => commands::products::run().await?,
        Commands::Recommend { query, budget } => commands::recommend::run(&query, budget).await?,
    }

    Ok(())
}
