mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Message gateway routing intents to REST and GraphQL APIs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration status
    Status,

    /// List configured connectors and their intents
    Connectors,

    /// Call a connector intent through the router
    Call {
        /// Connector name (routed to `api.<name>`)
        api: String,

        /// Intent to invoke
        intent: String,

        /// Request parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,

        /// Request data as a JSON object
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a starter configuration
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Status => {
            commands::status::run().await?;
        }
        Commands::Connectors => {
            commands::connectors::run().await?;
        }
        Commands::Call {
            api,
            intent,
            params,
            data,
        } => {
            commands::call::run(&api, &intent, params.as_deref(), data.as_deref()).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_cmd::show().await?,
            ConfigCommands::Path => commands::config_cmd::path().await?,
            ConfigCommands::Init { force } => commands::config_cmd::init(force).await?,
        },
    }

    Ok(())
}
