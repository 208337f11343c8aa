//! # yt_lemmy_bot
//!
//! Watches a list of YouTube channels for new uploads, scores each video
//! against keyword lists, and cross-posts the relevant ones to a Lemmy
//! community without posting the same link twice.
//!
//! ## Usage
//!
//! ```sh
//! yt_lemmy_bot --config ./config --logs ./logs [--mode single|continuous]
//! ```
//!
//! ## Architecture
//!
//! Each cycle is a sequential pipeline:
//! 1. **Fetching**: list uploads newer than the lookback window for every channel
//! 2. **Filtering**: score title and description against the keyword tiers
//! 3. **Publishing**: skip links already posted recently, post the rest
//!
//! Single mode runs one cycle. Continuous mode repeats it every
//! `check_interval_minutes` until the process is stopped.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, warn};

mod bot;
mod cli;
mod config;
mod dedupe;
mod error;
mod filter;
mod lemmy;
mod logging;
mod models;
mod publisher;
mod utils;
mod youtube;

use bot::Bot;
use cli::Cli;
use config::{BotConfig, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // A missing .env is normal.
    let dotenv_loaded = dotenv::dotenv().is_ok();

    // Settings are read before logging so the configured level applies;
    // a read failure is reported once the subscriber is up.
    let settings_result = config::read_settings(&args.config);
    let log_level = settings_result
        .as_ref()
        .map(|s| s.operation.log_level.clone())
        .unwrap_or_else(|_| "INFO".to_string());
    let _log_guard = logging::init(&args.logs, &log_level)?;

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "yt_lemmy_bot starting up");
    debug!(config_dir = %args.config.display(), log_dir = %args.logs.display(), dotenv_loaded, "Parsed CLI arguments");

    let settings = settings_result.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load main configuration; using defaults");
        Settings::default()
    });
    let config = BotConfig::assemble(settings, &args.config, |key| std::env::var(key).ok());
    let mode = args.run_mode(config.settings.operation.run_mode());

    let bot = Bot::connect(config).await;

    tokio::select! {
        _ = bot.run(mode) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Bot stopped by user");
        }
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}
