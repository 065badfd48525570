//! Pure sweep planning.
//!
//! Each planner takes a snapshot of the entities it cares about plus "now"
//! and returns the notifications to send and the mutated records to save.
//! Nothing here touches a store, a clock or the network.

use chrono::{DateTime, Duration, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::core::{Animal, AnimalState, Report, User, UserState};

/// A text for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub chat_id: i64,
    pub text: String,
}

impl Notification {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }
}

/// A record in its new state, plus the state the sweep found it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<T, S> {
    pub from: S,
    pub record: T,
}

fn move_user(user: &User, to: UserState) -> Transition<User, UserState> {
    Transition {
        from: user.state,
        record: User {
            state: to,
            ..user.clone()
        },
    }
}

fn move_animal(animal: &Animal, to: AnimalState) -> Transition<Animal, AnimalState> {
    Transition {
        from: animal.state,
        record: Animal {
            state: to,
            ..animal.clone()
        },
    }
}

/// Output of one sweep: notifications first, then records to persist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepPlan {
    pub notifications: Vec<Notification>,
    pub users: Vec<Transition<User, UserState>>,
    pub animals: Vec<Transition<Animal, AnimalState>>,
}

impl SweepPlan {
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && self.users.is_empty() && self.animals.is_empty()
    }
}

/// Entities the state sweep looks at.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub now: DateTime<Utc>,
    pub accepted: Vec<User>,
    pub refused: Vec<User>,
    pub prolonged: Vec<User>,
    pub probation: Vec<User>,
    /// Animals whose adopter is in `ACCEPTED`
    pub animals_of_accepted: Vec<Animal>,
    /// Animals whose adopter is in `REFUSE` or `BLACKLIST`
    pub animals_of_refused: Vec<Animal>,
    pub volunteers: Vec<User>,
    pub support_chat_id: Option<i64>,
}

/// One `IN_TEST` animal with its adopter and latest report.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub animal: Animal,
    pub adopter: Option<User>,
    pub latest: Option<Report>,
}

/// Entities the report-compliance sweep looks at.
#[derive(Debug, Clone)]
pub struct ReportSnapshot {
    pub now: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
    pub volunteers: Vec<User>,
    pub support_chat_id: Option<i64>,
}

mod texts {
    pub const PASSED: &str = "Congratulations! You have passed the probation period.";
    pub const FAILED: &str =
        "Unfortunately you have not passed the probation period. Please return the animal to the shelter.";
    pub const DECISION_PENDING: &str =
        "Your probation period is over. The volunteers are making the final decision, we will contact you soon.";
    pub const FIRST_REPORT: &str = "Please send your first report about the animal.";
    pub const LATE_REPORT: &str = "More than a day has passed since your last report. Please send a new one.";

    pub fn approved(name: &str) -> String {
        format!("Adoption approval confirmed for {}.", name)
    }

    pub fn refused(name: &str) -> String {
        format!("{} failed the probation period, the animal must be returned.", name)
    }

    pub fn prolonged_user(days: i64) -> String {
        format!("Your probation period has been extended: {} day(s) left.", days)
    }

    pub fn prolonged_volunteer(name: &str, days: i64) -> String {
        format!("Probation for {} extended: {} day(s) left.", name, days)
    }

    pub fn decide(name: &str, user_id: i64) -> String {
        format!("Probation for {} (user #{}) is over. Please make the adoption decision.", name, user_id)
    }

    pub fn overdue_user(days: i64) -> String {
        format!("You have not sent a report for {} days. Please send a report, a volunteer will contact you.", days)
    }

    pub fn overdue_volunteer(name: &str, animal: &str, days: i64) -> String {
        format!("{} has not sent a report about {} for {} days.", name, animal, days)
    }
}

fn notify_all(notifications: &mut Vec<Notification>, volunteers: &[User], text: &str) {
    notifications.extend(volunteers.iter().map(|v| Notification::new(v.chat_id, text)));
}

/// One volunteer picked at random, else the support chat.
fn decision_maker<R: Rng + ?Sized>(volunteers: &[User], support_chat_id: Option<i64>, rng: &mut R) -> Option<i64> {
    volunteers.choose(rng).map(|v| v.chat_id).or(support_chat_id)
}

/// Plans the user state transitions.
///
/// * `ACCEPTED -> ADOPTED`, the adopter's `IN_TEST` animal becomes `HAPPY_END`;
///   user and every volunteer are told.
/// * `REFUSE -> BLACKLIST`, animals of refused or blacklisted adopters go back
///   to `IN_SHELTER`; user and every volunteer are told.
/// * `PROLONGED -> PROBATION` with `end_test` untouched; the remaining days
///   until `end_test` go to the user and every volunteer.
/// * `PROBATION -> DECISION` once `end_test` is at or before `now`; the user
///   and one volunteer (or the support chat) are told.
pub fn plan_state_sweep<R: Rng + ?Sized>(snapshot: &StateSnapshot, rng: &mut R) -> SweepPlan {
    let mut plan = SweepPlan::default();
    let volunteers = &snapshot.volunteers;

    for user in &snapshot.accepted {
        plan.notifications.push(Notification::new(user.chat_id, texts::PASSED));
        notify_all(&mut plan.notifications, volunteers, &texts::approved(&user.display_name()));
        plan.users.push(move_user(user, UserState::Adopted));
    }
    for animal in &snapshot.animals_of_accepted {
        if animal.state == AnimalState::InTest {
            plan.animals.push(move_animal(animal, AnimalState::HappyEnd));
        }
    }

    for user in &snapshot.refused {
        plan.notifications.push(Notification::new(user.chat_id, texts::FAILED));
        notify_all(&mut plan.notifications, volunteers, &texts::refused(&user.display_name()));
        plan.users.push(move_user(user, UserState::Blacklist));
    }
    for animal in &snapshot.animals_of_refused {
        if animal.state != AnimalState::InShelter {
            plan.animals.push(move_animal(animal, AnimalState::InShelter));
        }
    }

    for user in &snapshot.prolonged {
        let days = user
            .end_test
            .map(|end| (end - snapshot.now).num_days().max(0))
            .unwrap_or(0);
        plan.notifications.push(Notification::new(user.chat_id, texts::prolonged_user(days)));
        notify_all(
            &mut plan.notifications,
            volunteers,
            &texts::prolonged_volunteer(&user.display_name(), days),
        );
        plan.users.push(move_user(user, UserState::Probation));
    }

    for user in &snapshot.probation {
        let Some(end_test) = user.end_test else {
            log::warn!("user #{} is on probation without an end date, skipping", user.id);
            continue;
        };
        if end_test > snapshot.now {
            continue;
        }
        plan.notifications.push(Notification::new(user.chat_id, texts::DECISION_PENDING));
        match decision_maker(volunteers, snapshot.support_chat_id, rng) {
            Some(chat_id) => plan
                .notifications
                .push(Notification::new(chat_id, texts::decide(&user.display_name(), user.id))),
            None => log::warn!(
                "user #{} awaits a decision but there is no volunteer or support chat to tell",
                user.id
            ),
        }
        plan.users.push(move_user(user, UserState::Decision));
    }

    plan
}

/// The most recent report: latest submission, then highest id.
pub fn latest_report(reports: &[Report]) -> Option<&Report> {
    reports.iter().max_by_key(|r| (r.submitted_at, r.id))
}

/// Plans report reminders.
///
/// Lateness is the time elapsed since the latest report was submitted. More
/// than two full days notifies the adopter and a volunteer (or the support
/// chat); more than one full day notifies the adopter only. An animal without
/// any report gets a reminder to the adopter.
pub fn plan_report_sweep<R: Rng + ?Sized>(snapshot: &ReportSnapshot, rng: &mut R) -> Vec<Notification> {
    let mut notifications = Vec::new();

    for entry in &snapshot.entries {
        let Some(adopter) = &entry.adopter else {
            log::warn!("animal #{} is in test without a resolvable adopter", entry.animal.id);
            continue;
        };
        let Some(latest) = &entry.latest else {
            notifications.push(Notification::new(adopter.chat_id, texts::FIRST_REPORT));
            continue;
        };

        let elapsed = snapshot.now - latest.submitted_at;
        if elapsed > Duration::days(2) {
            let days = elapsed.num_days();
            notifications.push(Notification::new(adopter.chat_id, texts::overdue_user(days)));
            match decision_maker(&snapshot.volunteers, snapshot.support_chat_id, rng) {
                Some(chat_id) => notifications.push(Notification::new(
                    chat_id,
                    texts::overdue_volunteer(&adopter.display_name(), &entry.animal.name, days),
                )),
                None => log::warn!("no volunteer or support chat to escalate user #{} to", adopter.id),
            }
        } else if elapsed > Duration::days(1) {
            notifications.push(Notification::new(adopter.chat_id, texts::LATE_REPORT));
        }
    }

    notifications
}
