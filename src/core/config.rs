//! Configuration read once from the environment

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: shelter.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "shelter.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Custom Bot API server URL (local telegram-bot-api)
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| env::var("BOT_API_URL").ok());

/// Support chat that receives escalations when no volunteer is registered
/// Read from SUPPORT_CHAT_ID environment variable
pub static SUPPORT_CHAT_ID: Lazy<Option<i64>> =
    Lazy::new(|| env::var("SUPPORT_CHAT_ID").ok().and_then(|v| v.trim().parse().ok()));

/// Reads an unsigned integer variable, falling back to `default` when unset or malformed.
fn env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Ignoring malformed {}={:?}, using {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Lifecycle scheduler configuration
pub mod lifecycle {
    use super::{env_u64, Duration, Lazy};

    /// Hours between probation state sweeps
    /// Read from STATE_SWEEP_INTERVAL_HOURS, default 3
    pub static STATE_SWEEP_INTERVAL_HOURS: Lazy<u64> = Lazy::new(|| env_u64("STATE_SWEEP_INTERVAL_HOURS", 3));

    /// Hours between report compliance sweeps
    /// Read from REPORT_SWEEP_INTERVAL_HOURS, default 4
    pub static REPORT_SWEEP_INTERVAL_HOURS: Lazy<u64> = Lazy::new(|| env_u64("REPORT_SWEEP_INTERVAL_HOURS", 4));

    /// First local hour (inclusive) in which sweeps may run
    /// Read from SWEEP_WINDOW_START_HOUR, default 9
    pub static WINDOW_START_HOUR: Lazy<u32> =
        Lazy::new(|| env_u64("SWEEP_WINDOW_START_HOUR", 9).min(23) as u32);

    /// Local hour (exclusive) at which sweeps stop running
    /// Read from SWEEP_WINDOW_END_HOUR, default 21
    pub static WINDOW_END_HOUR: Lazy<u32> = Lazy::new(|| env_u64("SWEEP_WINDOW_END_HOUR", 21).min(23) as u32);

    /// State sweep interval duration
    pub fn state_interval() -> Duration {
        Duration::from_secs((*STATE_SWEEP_INTERVAL_HOURS).max(1) * 60 * 60)
    }

    /// Report sweep interval duration
    pub fn report_interval() -> Duration {
        Duration::from_secs((*REPORT_SWEEP_INTERVAL_HOURS).max(1) * 60 * 60)
    }
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher retry attempts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    /// Base for the exponential backoff after a dispatcher panic (seconds)
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

    /// Dispatcher retry delay duration
    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Metrics configuration
pub mod metrics {
    use super::{env_u64, Lazy};
    use std::env;

    /// Whether the Prometheus endpoint is served
    /// Read from METRICS_ENABLED, default false
    pub static ENABLED: Lazy<bool> = Lazy::new(|| {
        env::var("METRICS_ENABLED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    });

    /// Port of the metrics server
    /// Read from METRICS_PORT, default 9090
    pub static PORT: Lazy<u16> = Lazy::new(|| u16::try_from(env_u64("METRICS_PORT", 9090)).unwrap_or(9090));
}
