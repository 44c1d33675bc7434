//! menuforge CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP gateway
//! - `suggest` — Run one query through the pipeline and print the response
//! - `doctor`  — Diagnose provider / inventory / knowledge health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "menuforge",
    about = "menuforge — budget-bounded AI menu suggestion service",
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
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a single query through the pipeline
    Suggest {
        /// The meal request (e.g. "Korean lunch for 2 people, 200k")
        query: String,

        /// Track dish history under this user id
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Suggest { query, user } => commands::suggest::run(&query, user.as_deref()).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
