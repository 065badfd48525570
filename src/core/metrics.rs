//! Metrics collection for the shelter bot using Prometheus
//!
//! Tracks:
//! - Conversation traffic (inbound events by route, outbound messages)
//! - Lifecycle sweeps (runs, per-record failures, notifications sent)

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    /// Inbound events by the route the router picked
    /// Labels: route (callback/menu/pending/reply/ignored)
    pub static ref EVENTS_TOTAL: CounterVec = register_counter_vec!(
        "shelterbot_events_total",
        "Inbound events by router classification",
        &["route"]
    )
    .unwrap();

    /// Outbound messages handed to the notification sink
    /// Labels: status (sent/failed)
    pub static ref OUTBOUND_MESSAGES_TOTAL: CounterVec = register_counter_vec!(
        "shelterbot_outbound_messages_total",
        "Outbound messages by delivery status",
        &["status"]
    )
    .unwrap();

    /// Handler failures converted to an apology at the dispatch boundary
    /// Labels: route
    pub static ref HANDLER_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "shelterbot_handler_failures_total",
        "Handler errors caught at the dispatch boundary",
        &["route"]
    )
    .unwrap();

    /// Completed lifecycle sweeps
    /// Labels: sweep (state/reports)
    pub static ref SWEEP_RUNS_TOTAL: CounterVec = register_counter_vec!(
        "shelterbot_sweep_runs_total",
        "Completed lifecycle sweeps",
        &["sweep"]
    )
    .unwrap();

    /// Records whose persistence failed during a sweep
    /// Labels: sweep, entity (user/animal)
    pub static ref SWEEP_RECORD_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "shelterbot_sweep_record_failures_total",
        "Per-record persistence failures during sweeps",
        &["sweep", "entity"]
    )
    .unwrap();

    /// Notifications emitted by sweeps
    /// Labels: sweep, status (sent/failed)
    pub static ref SWEEP_NOTIFICATIONS_TOTAL: CounterVec = register_counter_vec!(
        "shelterbot_sweep_notifications_total",
        "Notifications emitted by lifecycle sweeps",
        &["sweep", "status"]
    )
    .unwrap();
}

/// Forces registration of every metric so `/metrics` lists them before first use.
pub fn init_metrics() {
    lazy_static::initialize(&EVENTS_TOTAL);
    lazy_static::initialize(&OUTBOUND_MESSAGES_TOTAL);
    lazy_static::initialize(&HANDLER_FAILURES_TOTAL);
    lazy_static::initialize(&SWEEP_RUNS_TOTAL);
    lazy_static::initialize(&SWEEP_RECORD_FAILURES_TOTAL);
    lazy_static::initialize(&SWEEP_NOTIFICATIONS_TOTAL);
    log::info!("Metrics registry initialized");
}
