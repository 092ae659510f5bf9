pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::allocate::AllocateArgs;
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Allocate(AllocateArgs),
    Strategies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Stock portfolio suggestion engine starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Allocate(args) => {
            let provider =
                providers::yahoo_finance::YahooFinanceProvider::new(&config.providers.yahoo.base_url);
            let as_of = chrono::Local::now().date_naive();
            cli::allocate::run(&args, &config, &provider, as_of).await
        }
        AppCommand::Strategies => {
            cli::strategies::run();
            Ok(())
        }
    }
}
