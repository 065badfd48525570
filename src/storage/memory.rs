//! In-memory entity store.
//!
//! Backs the test suites. Semantics match
//! [`SqliteStore`](super::SqliteStore): versioned saves, lowest-id-wins for
//! duplicate daily reports, users created in `SEARCH` state.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::core::{AppError, AppResult, Animal, Report, Shelter, User, UserState};
use crate::storage::store::{is_in_test_with_user, EntityStore, ShelterCatalog};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    animals: BTreeMap<i64, Animal>,
    reports: BTreeMap<i64, Report>,
    shelters: BTreeMap<i64, Shelter>,
    next_id: i64,
    /// (entity, id) pairs whose saves fail with a database-style error
    failing: HashSet<(&'static str, i64)>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_failure(&self, entity: &'static str, id: i64) -> AppResult<()> {
        if self.failing.contains(&(entity, id)) {
            return Err(AppError::Validation(format!("{} #{} rejected by store", entity, id)));
        }
        Ok(())
    }
}

/// Bumps the version of `incoming` after checking it against the stored copy.
fn versioned<T: Clone>(
    entity: &'static str,
    id: i64,
    stored_version: Option<i64>,
    incoming_version: i64,
    mut incoming: T,
    set_version: impl FnOnce(&mut T, i64),
) -> AppResult<T> {
    match stored_version {
        None => Err(AppError::not_found(format!("{} #{}", entity, id))),
        Some(v) if v != incoming_version => Err(AppError::Conflict { entity, id }),
        Some(v) => {
            set_version(&mut incoming, v + 1);
            Ok(incoming)
        }
    }
}

/// Entity store kept entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `user` under a freshly allocated id and returns the stored copy.
    pub async fn insert_user(&self, mut user: User) -> User {
        let mut tables = self.tables.lock().await;
        user.id = tables.allocate_id();
        tables.users.insert(user.id, user.clone());
        user
    }

    pub async fn insert_animal(&self, mut animal: Animal) -> Animal {
        let mut tables = self.tables.lock().await;
        animal.id = tables.allocate_id();
        tables.animals.insert(animal.id, animal.clone());
        animal
    }

    pub async fn insert_report(&self, mut report: Report) -> Report {
        let mut tables = self.tables.lock().await;
        report.id = tables.allocate_id();
        tables.reports.insert(report.id, report.clone());
        report
    }

    pub async fn insert_shelter(&self, mut shelter: Shelter) -> Shelter {
        let mut tables = self.tables.lock().await;
        shelter.id = tables.allocate_id();
        tables.shelters.insert(shelter.id, shelter.clone());
        shelter
    }

    /// Makes every later save of `entity` (`"user"`, `"animal"`, `"report"`) `id` fail.
    pub async fn fail_saves_for(&self, entity: &'static str, id: i64) {
        self.tables.lock().await.failing.insert((entity, id));
    }

    pub async fn reports_of_user(&self, user_id: i64) -> Vec<Report> {
        let tables = self.tables.lock().await;
        tables.reports.values().filter(|r| r.user_id == user_id).cloned().collect()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_chat_id(&self, chat_id: i64) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.chat_id == chat_id).cloned())
    }

    async fn create_user(&self, chat_id: i64, name: Option<String>) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.users.values().find(|u| u.chat_id == chat_id) {
            return Ok(existing.clone());
        }
        let user = User {
            id: tables.allocate_id(),
            chat_id,
            name,
            surname: None,
            phone: None,
            email: None,
            state: UserState::Search,
            end_test: None,
            is_volunteer: false,
            animal_id: None,
            shelter_id: None,
            version: 0,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_users_by_state(&self, state: UserState) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().filter(|u| u.state == state).cloned().collect())
    }

    async fn find_volunteers(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().filter(|u| u.is_volunteer).cloned().collect())
    }

    async fn find_animal(&self, id: i64) -> AppResult<Option<Animal>> {
        Ok(self.tables.lock().await.animals.get(&id).cloned())
    }

    async fn find_animals_by_user_state(&self, state: UserState) -> AppResult<Vec<Animal>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .animals
            .values()
            .filter(|a| {
                a.user_id
                    .and_then(|uid| tables.users.get(&uid))
                    .is_some_and(|u| u.state == state)
            })
            .cloned()
            .collect())
    }

    async fn find_animals_in_test_with_user(&self) -> AppResult<Vec<Animal>> {
        let tables = self.tables.lock().await;
        Ok(tables.animals.values().filter(|a| is_in_test_with_user(a)).cloned().collect())
    }

    async fn find_reports_by_animal(&self, animal_id: i64) -> AppResult<Vec<Report>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reports
            .values()
            .filter(|r| r.animal_id == Some(animal_id))
            .cloned()
            .collect())
    }

    async fn find_or_create_todays_report(&self, user: &User, date: NaiveDate) -> AppResult<Report> {
        let mut tables = self.tables.lock().await;
        // BTreeMap iterates by ascending id
        if let Some(existing) = tables.reports.values().find(|r| r.user_id == user.id && r.date == date) {
            return Ok(existing.clone());
        }
        let report = Report {
            id: tables.allocate_id(),
            animal_id: user.animal_id,
            user_id: user.id,
            date,
            submitted_at: Utc::now(),
            diet: None,
            behavior: None,
            wellbeing: None,
            photo: None,
            version: 0,
        };
        tables.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn save_user(&self, user: &User) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("user", user.id)?;
        let stored = tables.users.get(&user.id).map(|u| u.version);
        let saved = versioned("user", user.id, stored, user.version, user.clone(), |u, v| u.version = v)?;
        tables.users.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn save_animal(&self, animal: &Animal) -> AppResult<Animal> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("animal", animal.id)?;
        let stored = tables.animals.get(&animal.id).map(|a| a.version);
        let saved = versioned("animal", animal.id, stored, animal.version, animal.clone(), |a, v| {
            a.version = v
        })?;
        tables.animals.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn save_report(&self, report: &Report) -> AppResult<Report> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("report", report.id)?;
        let stored = tables.reports.get(&report.id).map(|r| r.version);
        let saved = versioned("report", report.id, stored, report.version, report.clone(), |r, v| {
            r.version = v
        })?;
        tables.reports.insert(saved.id, saved.clone());
        Ok(saved)
    }
}

#[async_trait]
impl ShelterCatalog for MemoryStore {
    async fn find_shelter(&self, id: i64) -> AppResult<Option<Shelter>> {
        Ok(self.tables.lock().await.shelters.get(&id).cloned())
    }

    async fn list_shelters(&self) -> AppResult<Vec<Shelter>> {
        Ok(self.tables.lock().await.shelters.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AnimalState;

    fn animal(user_id: Option<i64>, state: AnimalState) -> Animal {
        Animal {
            id: 0,
            name: "Rex".to_string(),
            breed: None,
            state,
            user_id,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_create_user_starts_in_search() {
        let store = MemoryStore::new();
        let user = store.create_user(100, Some("Anna".to_string())).await.unwrap();
        assert_eq!(user.state, UserState::Search);
        assert_eq!(store.find_user_by_chat_id(100).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_create_user_is_idempotent_per_chat() {
        let store = MemoryStore::new();
        let first = store.create_user(100, None).await.unwrap();
        let second = store.create_user(100, None).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let store = MemoryStore::new();
        let user = store.create_user(100, None).await.unwrap();

        let mut first = user.clone();
        first.phone = Some("+1 555 0100".to_string());
        let saved = store.save_user(&first).await.unwrap();
        assert_eq!(saved.version, 1);

        let mut second = user;
        second.email = Some("a@b.org".to_string());
        let err = store.save_user(&second).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { entity: "user", .. }));

        let stored = store.find_user(saved.id).await.unwrap().unwrap();
        assert_eq!(stored.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(stored.email, None);
    }

    #[tokio::test]
    async fn test_todays_report_is_created_once() {
        let store = MemoryStore::new();
        let user = store.create_user(100, None).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let first = store.find_or_create_todays_report(&user, today).await.unwrap();
        let again = store.find_or_create_todays_report(&user, today).await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(store.reports_of_user(user.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_animals_by_user_state() {
        let store = MemoryStore::new();
        let accepted = store.create_user(1, None).await.unwrap();
        let mut accepted = accepted.clone();
        accepted.state = UserState::Accepted;
        let accepted = store.save_user(&accepted).await.unwrap();
        let other = store.create_user(2, None).await.unwrap();

        let mine = store.insert_animal(animal(Some(accepted.id), AnimalState::InTest)).await;
        store.insert_animal(animal(Some(other.id), AnimalState::InTest)).await;
        store.insert_animal(animal(None, AnimalState::InShelter)).await;

        let found = store.find_animals_by_user_state(UserState::Accepted).await.unwrap();
        assert_eq!(found, vec![mine]);
        assert_eq!(store.find_animals_in_test_with_user().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        let user = store.create_user(1, None).await.unwrap();
        store.fail_saves_for("user", user.id).await;
        assert!(store.save_user(&user).await.is_err());
    }
}
