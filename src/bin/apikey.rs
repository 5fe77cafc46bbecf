//! API Key CLI
//!
//! Creates API keys for the management service and manages the local login
//! session.
//!
//! ## Usage
//!
//! ```bash
//! # Create a key (app_id is remembered after the first use)
//! apikey create --app_id app-123 ci-bot
//!
//! # Log in ahead of time, or drop the cached token
//! apikey login
//! apikey logout
//! ```

use anyhow::{Context, Result};
use apikey_cli::{
    command::{self, CreateArgs},
    ApiClient, CliConfig, ConfigStore, Ed25519Provider, PromptCredentials, Session,
};
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "apikey")]
#[command(about = "Manage API keys for the management service")]
struct Cli {
    /// Path to settings file (default: config.toml in the CLI home or APIKEY_CLI_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log request details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new api-key
    #[command(visible_alias = "c")]
    Create(CreateArgs),
    /// Log in and cache an access token
    Login,
    /// Remove the cached access token
    Logout,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command results only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let store = ConfigStore::open_default()?;
    let config = CliConfig::load_from_path(cli.config.as_deref(), &store)
        .context("Failed to load configuration")?;
    let client = ApiClient::from_config(&config).context("Failed to create HTTP client")?;
    let session = Session::new(client, store, PromptCredentials);

    match cli.command {
        Commands::Create(args) => {
            let provider = Ed25519Provider::new();
            let created = command::create::run(&args, &provider, &session, &config.retry_policy())?;

            println!("{}", created);
        }
        Commands::Login => {
            command::session::login(&session)?;
            println!("Logged in");
        }
        Commands::Logout => {
            if command::session::logout(&session)? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }
    }

    Ok(())
}
