//! Executes sweeps against the store and the notification sink.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::conversation::NotificationSink;
use crate::core::metrics::{SWEEP_NOTIFICATIONS_TOTAL, SWEEP_RECORD_FAILURES_TOTAL, SWEEP_RUNS_TOTAL};
use crate::core::{Animal, AnimalState, AppError, AppResult, User, UserState};
use crate::lifecycle::sweep::{
    latest_report, plan_report_sweep, plan_state_sweep, Notification, ReportEntry, ReportSnapshot, StateSnapshot,
    SweepPlan, Transition,
};
use crate::storage::EntityStore;

/// Saves per record, counting the reloads after a version conflict.
const SAVE_ATTEMPTS: usize = 3;

/// A record a sweep moves between states.
#[async_trait]
trait SweepRecord: Clone + Send + Sync + Sized {
    type State: Copy + PartialEq + fmt::Display + Send + Sync;

    const ENTITY: &'static str;

    fn id(&self) -> i64;

    fn state(&self) -> Self::State;

    fn set_state(&mut self, state: Self::State);

    async fn load(store: &dyn EntityStore, id: i64) -> AppResult<Option<Self>>;

    async fn save(&self, store: &dyn EntityStore) -> AppResult<Self>;
}

#[async_trait]
impl SweepRecord for User {
    type State = UserState;

    const ENTITY: &'static str = "user";

    fn id(&self) -> i64 {
        self.id
    }

    fn state(&self) -> UserState {
        self.state
    }

    fn set_state(&mut self, state: UserState) {
        self.state = state;
    }

    async fn load(store: &dyn EntityStore, id: i64) -> AppResult<Option<Self>> {
        store.find_user(id).await
    }

    async fn save(&self, store: &dyn EntityStore) -> AppResult<Self> {
        store.save_user(self).await
    }
}

#[async_trait]
impl SweepRecord for Animal {
    type State = AnimalState;

    const ENTITY: &'static str = "animal";

    fn id(&self) -> i64 {
        self.id
    }

    fn state(&self) -> AnimalState {
        self.state
    }

    fn set_state(&mut self, state: AnimalState) {
        self.state = state;
    }

    async fn load(store: &dyn EntityStore, id: i64) -> AppResult<Option<Self>> {
        store.find_animal(id).await
    }

    async fn save(&self, store: &dyn EntityStore) -> AppResult<Self> {
        store.save_animal(self).await
    }
}

/// The two independent sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    State,
    Reports,
}

impl SweepKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            SweepKind::State => "state",
            SweepKind::Reports => "reports",
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Another run of the same sweep was still in progress
    pub skipped: bool,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub records_saved: usize,
    pub records_failed: usize,
}

/// Loads snapshots, plans, notifies, then persists.
///
/// Each sweep kind has its own guard: a run that finds the previous one of the
/// same kind still going is skipped rather than queued.
pub struct LifecycleRunner {
    store: Arc<dyn EntityStore>,
    sink: Arc<dyn NotificationSink>,
    support_chat_id: Option<i64>,
    state_guard: Mutex<()>,
    reports_guard: Mutex<()>,
}

impl LifecycleRunner {
    pub fn new(store: Arc<dyn EntityStore>, sink: Arc<dyn NotificationSink>, support_chat_id: Option<i64>) -> Self {
        Self {
            store,
            sink,
            support_chat_id,
            state_guard: Mutex::new(()),
            reports_guard: Mutex::new(()),
        }
    }

    pub async fn run(&self, kind: SweepKind) -> AppResult<SweepSummary> {
        match kind {
            SweepKind::State => self.run_state_sweep().await,
            SweepKind::Reports => self.run_report_sweep().await,
        }
    }

    pub async fn run_state_sweep(&self) -> AppResult<SweepSummary> {
        let Ok(_running) = self.state_guard.try_lock() else {
            log::warn!("State sweep still running, skipping this run");
            return Ok(SweepSummary {
                skipped: true,
                ..Default::default()
            });
        };

        let snapshot = self.load_state_snapshot().await?;
        let plan = {
            let mut rng = rand::rng();
            plan_state_sweep(&snapshot, &mut rng)
        };
        let summary = self.execute(SweepKind::State, plan).await;
        log::info!(
            "State sweep done: {} notification(s) sent, {} failed; {} record(s) saved, {} failed",
            summary.notifications_sent,
            summary.notifications_failed,
            summary.records_saved,
            summary.records_failed
        );
        Ok(summary)
    }

    pub async fn run_report_sweep(&self) -> AppResult<SweepSummary> {
        let Ok(_running) = self.reports_guard.try_lock() else {
            log::warn!("Report sweep still running, skipping this run");
            return Ok(SweepSummary {
                skipped: true,
                ..Default::default()
            });
        };

        let snapshot = self.load_report_snapshot().await?;
        let notifications = {
            let mut rng = rand::rng();
            plan_report_sweep(&snapshot, &mut rng)
        };
        let plan = SweepPlan {
            notifications,
            ..Default::default()
        };
        let summary = self.execute(SweepKind::Reports, plan).await;
        log::info!(
            "Report sweep done: {} animal(s) checked, {} reminder(s) sent, {} failed",
            snapshot.entries.len(),
            summary.notifications_sent,
            summary.notifications_failed
        );
        Ok(summary)
    }

    async fn load_state_snapshot(&self) -> AppResult<StateSnapshot> {
        let store = &self.store;
        let mut animals_of_refused = store.find_animals_by_user_state(UserState::Refuse).await?;
        animals_of_refused.extend(store.find_animals_by_user_state(UserState::Blacklist).await?);

        Ok(StateSnapshot {
            now: Utc::now(),
            accepted: store.find_users_by_state(UserState::Accepted).await?,
            refused: store.find_users_by_state(UserState::Refuse).await?,
            prolonged: store.find_users_by_state(UserState::Prolonged).await?,
            probation: store.find_users_by_state(UserState::Probation).await?,
            animals_of_accepted: store.find_animals_by_user_state(UserState::Accepted).await?,
            animals_of_refused,
            volunteers: store.find_volunteers().await?,
            support_chat_id: self.support_chat_id,
        })
    }

    async fn load_report_snapshot(&self) -> AppResult<ReportSnapshot> {
        let animals = self.store.find_animals_in_test_with_user().await?;
        let mut entries = Vec::with_capacity(animals.len());

        for animal in animals {
            let adopter = match animal.user_id {
                Some(user_id) => self.store.find_user(user_id).await?,
                None => None,
            };
            let reports = self.store.find_reports_by_animal(animal.id).await?;
            let latest = latest_report(&reports).cloned();
            entries.push(ReportEntry { animal, adopter, latest });
        }

        Ok(ReportSnapshot {
            now: Utc::now(),
            entries,
            volunteers: self.store.find_volunteers().await?,
            support_chat_id: self.support_chat_id,
        })
    }

    /// Sends every notification, then saves every record. Failures are counted
    /// and logged per item; nothing is rolled back.
    async fn execute(&self, kind: SweepKind, plan: SweepPlan) -> SweepSummary {
        let sweep = kind.as_label();
        let mut summary = SweepSummary::default();

        for Notification { chat_id, text } in &plan.notifications {
            match self.sink.send(*chat_id, text, None).await {
                Ok(()) => {
                    summary.notifications_sent += 1;
                    SWEEP_NOTIFICATIONS_TOTAL.with_label_values(&[sweep, "sent"]).inc();
                }
                Err(e) => {
                    summary.notifications_failed += 1;
                    SWEEP_NOTIFICATIONS_TOTAL.with_label_values(&[sweep, "failed"]).inc();
                    log::warn!("{} sweep: notification to chat {} failed: {}", sweep, chat_id, e);
                }
            }
        }

        for transition in &plan.users {
            self.persist(sweep, transition, &mut summary).await;
        }
        for transition in &plan.animals {
            self.persist(sweep, transition, &mut summary).await;
        }

        SWEEP_RUNS_TOTAL.with_label_values(&[sweep]).inc();
        summary
    }

    async fn persist<T: SweepRecord>(
        &self,
        sweep: &str,
        transition: &Transition<T, T::State>,
        summary: &mut SweepSummary,
    ) {
        let id = transition.record.id();
        match self.save_transition(transition).await {
            Ok(saved) => {
                summary.records_saved += 1;
                log::info!("{} #{} is now {}", T::ENTITY, id, saved.state());
            }
            Err(e) => {
                summary.records_failed += 1;
                SWEEP_RECORD_FAILURES_TOTAL.with_label_values(&[sweep, T::ENTITY]).inc();
                log::error!("{} sweep: saving {} #{} failed: {}", sweep, T::ENTITY, id, e);
            }
        }
    }

    /// Saves the new state. When someone else saved the record since the
    /// snapshot, the state change is re-applied on the fresh copy as long as
    /// the record is still in the state the sweep planned from.
    async fn save_transition<T: SweepRecord>(&self, transition: &Transition<T, T::State>) -> AppResult<T> {
        let store = self.store.as_ref();
        let target = transition.record.state();
        let mut candidate = transition.record.clone();
        let mut attempt = 1;

        loop {
            match candidate.save(store).await {
                Err(AppError::Conflict { entity, id }) if attempt < SAVE_ATTEMPTS => {
                    let mut current = T::load(store, id)
                        .await?
                        .ok_or_else(|| AppError::not_found(format!("{} #{}", entity, id)))?;
                    if current.state() != transition.from {
                        log::warn!(
                            "{} #{} moved from {} to {} since the sweep read it, leaving it alone",
                            entity,
                            id,
                            transition.from,
                            current.state()
                        );
                        return Err(AppError::Conflict { entity, id });
                    }
                    log::debug!("{} #{} changed concurrently, re-applying {}", entity, id, target);
                    current.set_state(target);
                    candidate = current;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
