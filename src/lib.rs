pub mod cli;
pub mod clients;
pub mod config;
pub mod cursor;
pub mod db;
pub mod domain;
pub mod models;
pub mod normalize;
pub mod services;

use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::InitConfig => {
            let path = cli.config.unwrap_or_else(Config::default_config_path);
            cli::cmd_init(&path)
        }
        Commands::Run => cli::cmd_sync(&setup(cli.config.as_deref())?).await,
        Commands::Rescan { window } => {
            cli::cmd_rescan(&setup(cli.config.as_deref())?, window).await
        }
        Commands::Clean => cli::cmd_clean(&setup(cli.config.as_deref())?),
    }
}

/// Loads and validates the config, then installs the tracing subscriber.
fn setup(config_path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    init_tracing(&config);

    info!(
        database = %config.general.database_path,
        catalog = %config.catalog.base_url,
        "Dramarr starting"
    );

    Ok(config)
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
