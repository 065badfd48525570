//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the configuration the bot runs with

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at startup
///
/// Mentions the support fallback explicitly: without volunteers and without
/// `SUPPORT_CHAT_ID` the decision and late-report escalations go nowhere.
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🐾 Shelter bot configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("  • Database: {}", config::DATABASE_PATH.as_str());
    log::info!(
        "  • Bot API: {}",
        config::BOT_API_URL.as_deref().unwrap_or("https://api.telegram.org")
    );
    log::info!(
        "  • State sweep: every {}h, report sweep: every {}h",
        *config::lifecycle::STATE_SWEEP_INTERVAL_HOURS,
        *config::lifecycle::REPORT_SWEEP_INTERVAL_HOURS
    );
    log::info!(
        "  • Sweep window: {:02}:00-{:02}:00 local time",
        *config::lifecycle::WINDOW_START_HOUR,
        *config::lifecycle::WINDOW_END_HOUR
    );

    match *config::SUPPORT_CHAT_ID {
        Some(chat_id) => log::info!("  • Support chat: {}", chat_id),
        None => {
            log::warn!("⚠️  SUPPORT_CHAT_ID: not set");
            log::warn!("   Escalations are dropped while no volunteer is registered");
        }
    }

    if *config::metrics::ENABLED {
        log::info!("  • Metrics: http://0.0.0.0:{}/metrics", *config::metrics::PORT);
    } else {
        log::info!("  • Metrics: disabled (METRICS_ENABLED=false)");
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
