pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::correlate::CorrelateOptions;
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::providers::caching::PRICE_CACHE_NAME;
use crate::providers::{CachingPriceProvider, YahooFinanceProvider};
use anyhow::Result;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Correlate(Box<CorrelateOptions>),
    Baskets,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("corrmat starting...");
    let config = load_config(config_path)?;

    match command {
        AppCommand::Correlate(options) => {
            let yahoo = YahooFinanceProvider::new(config.yahoo_base_url());
            let cache = config
                .cache_path()
                .and_then(|path| Cache::open(&path, PRICE_CACHE_NAME, config.cache_ttl()));
            match cache {
                Ok(cache) => {
                    let provider = CachingPriceProvider::new(yahoo, cache);
                    cli::correlate::run(&options, &provider, &config.baskets).await
                }
                Err(e) => {
                    warn!("Price cache unavailable, fetching without it: {e:#}");
                    cli::correlate::run(&options, &yahoo, &config.baskets).await
                }
            }
        }
        AppCommand::Baskets => {
            cli::baskets::run(&config.baskets);
            Ok(())
        }
    }
}
