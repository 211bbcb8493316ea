//! Raven CLI — the main entry point.
//!
//! Commands:
//! - `chat`      — Interactive terminal session
//! - `ask`       — One conversation turn, reply printed to stdout
//! - `run`       — Serve the Discord stub (in-process, no gateway connection)
//! - `status`    — Show configuration summary and provider reachability
//! - `init`      — Write a starter config file
//! - `knowledge` — Print the built-in music knowledge

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "raven",
    about = "Raven — an emo music companion 🖤",
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
    /// Chat with Raven in the terminal
    Chat {
        /// Name Raven calls you by
        #[arg(short, long, default_value = "User")]
        name: String,
    },

    /// Send a single message and print the reply
    Ask {
        /// Sender id used for conversation context
        #[arg(short, long, default_value = "local_user")]
        user: String,

        /// Display name used in the prompt
        #[arg(short, long, default_value = "User")]
        name: String,

        /// The message text
        message: String,
    },

    /// Serve the Discord stub (in-process, no gateway connection)
    Run,

    /// Show configuration status and check the provider
    Status,

    /// Write a starter config file to ~/.raven/config.toml
    Init,

    /// Print the knowledge base, or a single category
    Knowledge {
        /// Category key, e.g. `pop_punk`
        category: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
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
        Commands::Chat { name } => commands::chat::run(name).await?,
        Commands::Ask {
            user,
            name,
            message,
        } => commands::ask::run(&user, &name, &message).await?,
        Commands::Run => commands::run::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Init => commands::init::run()?,
        Commands::Knowledge { category, json } => {
            commands::knowledge::run(category.as_deref(), json)?
        }
    }

    Ok(())
}
