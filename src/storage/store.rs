//! Persistence seams consumed by the conversation engine and the lifecycle sweeps.
//!
//! Both traits are object-safe so handlers and sweeps can hold an
//! `Arc<dyn EntityStore>` and stay agnostic of SQLite vs. the in-memory store.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::core::{AnimalState, AppResult, Animal, Report, Shelter, User, UserState};

/// Load/save access to users, animals and reports.
///
/// Saves are versioned: the entity passed in must carry the version it was
/// loaded with. A mismatch means somebody else saved the record in between and
/// yields `AppError::Conflict`; on success the stored copy (with the bumped
/// version) is returned.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_user(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_user_by_chat_id(&self, chat_id: i64) -> AppResult<Option<User>>;

    /// Inserts a fresh user in `SEARCH` state for a chat seen for the first time.
    async fn create_user(&self, chat_id: i64, name: Option<String>) -> AppResult<User>;

    async fn find_users_by_state(&self, state: UserState) -> AppResult<Vec<User>>;

    async fn find_volunteers(&self) -> AppResult<Vec<User>>;

    async fn find_animal(&self, id: i64) -> AppResult<Option<Animal>>;

    /// Animals whose adopter is currently in `state`.
    async fn find_animals_by_user_state(&self, state: UserState) -> AppResult<Vec<Animal>>;

    /// Animals in `IN_TEST` that have an adopter linked.
    async fn find_animals_in_test_with_user(&self) -> AppResult<Vec<Animal>>;

    async fn find_reports_by_animal(&self, animal_id: i64) -> AppResult<Vec<Report>>;

    /// Returns the user's report for `date`, creating an empty one if needed.
    ///
    /// Should several reports exist for the same day, the one with the lowest
    /// id wins.
    async fn find_or_create_todays_report(&self, user: &User, date: NaiveDate) -> AppResult<Report>;

    async fn save_user(&self, user: &User) -> AppResult<User>;

    async fn save_animal(&self, animal: &Animal) -> AppResult<Animal>;

    async fn save_report(&self, report: &Report) -> AppResult<Report>;
}

/// Read-only access to shelters and their static informational content.
#[async_trait]
pub trait ShelterCatalog: Send + Sync {
    async fn find_shelter(&self, id: i64) -> AppResult<Option<Shelter>>;

    /// All shelters ordered by id (used for the `/start` selection prompt).
    async fn list_shelters(&self) -> AppResult<Vec<Shelter>>;
}

/// An `IN_TEST` animal with an adopter linked.
pub(crate) fn is_in_test_with_user(animal: &Animal) -> bool {
    animal.state == AnimalState::InTest && animal.user_id.is_some()
}
