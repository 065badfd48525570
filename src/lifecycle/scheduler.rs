//! Background tickers driving the lifecycle sweeps.
//!
//! One `tokio::spawn`ed loop per sweep kind. Each loop awaits its sweep before
//! the next tick, and ticks missed while a sweep ran are skipped, so a sweep
//! never overlaps itself.

use std::sync::Arc;

use chrono::{Local, Timelike};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::config;
use crate::lifecycle::runner::{LifecycleRunner, SweepKind};

/// When the sweeps run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    pub state_interval: Duration,
    pub report_interval: Duration,
    /// First hour (local time) in which sweeps may run
    pub window_start_hour: u32,
    /// Hour (local time) from which sweeps stop running
    pub window_end_hour: u32,
}

impl SweepSchedule {
    pub fn from_config() -> Self {
        Self {
            state_interval: config::lifecycle::state_interval(),
            report_interval: config::lifecycle::report_interval(),
            window_start_hour: *config::lifecycle::WINDOW_START_HOUR,
            window_end_hour: *config::lifecycle::WINDOW_END_HOUR,
        }
    }

    pub fn interval_for(&self, kind: SweepKind) -> Duration {
        match kind {
            SweepKind::State => self.state_interval,
            SweepKind::Reports => self.report_interval,
        }
    }

    /// Whether `hour` falls in `[start, end)`. A window whose start is after
    /// its end wraps past midnight; equal bounds mean "always".
    pub fn in_window(&self, hour: u32) -> bool {
        let (start, end) = (self.window_start_hour, self.window_end_hour);
        if start == end {
            true
        } else if start < end {
            (start..end).contains(&hour)
        } else {
            hour >= start || hour < end
        }
    }
}

/// Spawns both sweep loops. They stop when `cancel` fires.
pub fn start_scheduler(
    runner: Arc<LifecycleRunner>,
    schedule: SweepSchedule,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    log::info!(
        "Lifecycle scheduler started (state every {}s, reports every {}s, window {}:00-{}:00)",
        schedule.state_interval.as_secs(),
        schedule.report_interval.as_secs(),
        schedule.window_start_hour,
        schedule.window_end_hour
    );

    [SweepKind::State, SweepKind::Reports]
        .into_iter()
        .map(|kind| tokio::spawn(sweep_loop(Arc::clone(&runner), schedule, kind, cancel.clone())))
        .collect()
}

async fn sweep_loop(runner: Arc<LifecycleRunner>, schedule: SweepSchedule, kind: SweepKind, cancel: CancellationToken) {
    let mut ticker = interval(schedule.interval_for(kind));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; sweeps start one interval after boot
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("{} sweep loop stopped", kind);
                return;
            }
            _ = ticker.tick() => {}
        }

        let hour = Local::now().hour();
        if !schedule.in_window(hour) {
            log::debug!("{} sweep skipped outside the daytime window (hour {})", kind, hour);
            continue;
        }

        if let Err(e) = runner.run(kind).await {
            log::error!("{} sweep failed: {}", kind, e);
        }
    }
}
