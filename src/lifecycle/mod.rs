//! Adoption lifecycle: timed sweeps that advance users through probation
//! and remind adopters about overdue reports.

pub mod runner;
pub mod scheduler;
pub mod sweep;

pub use runner::{LifecycleRunner, SweepKind, SweepSummary};
pub use scheduler::{start_scheduler, SweepSchedule};
pub use sweep::{plan_report_sweep, plan_state_sweep, Notification, SweepPlan, Transition};
