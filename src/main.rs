//! vtrim command-line front end
//!
//! # Usage
//!
//! ```bash
//! vtrim probe interview.mp4
//! vtrim plan --session shoot.toml
//! vtrim export --session shoot.toml --out trimmed/
//! vtrim history trimmed/interview.mp4 --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use vtrim::adapters::{init_tracing, Settings};
use vtrim::app::DefaultAppContainer;
use vtrim::cli::{commands, Cli, Commands};

/// Main entry point for the vtrim CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    settings.apply_env();
    cli.apply_overrides(&mut settings);
    settings.validate()?;

    init_tracing(&settings.logging);
    if let Some(path) = &settings.source {
        info!("Loaded configuration from {}", path.display());
    }
    debug!("Settings: {:?}", settings);

    let container = DefaultAppContainer::new(&settings)?;

    match cli.command {
        Commands::Probe(args) => {
            info!("Executing probe command");
            commands::probe(&container, args).await?;
        }
        Commands::Plan(args) => {
            info!("Executing plan command");
            commands::plan(&container, args).await?;
        }
        Commands::Export(args) => {
            info!("Executing export command");
            commands::export(&container, args).await?;
        }
        Commands::History(args) => {
            info!("Executing history command");
            commands::history(&container, args).await?;
        }
    }

    Ok(())
}
