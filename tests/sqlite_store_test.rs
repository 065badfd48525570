//! SQLite store behavior on a fresh database file
//!
//! Run with: cargo test --test sqlite_store_test

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use shelterbot::core::{Animal, AnimalState, AppError, InfoTopic, Shelter, ShelterKind, UserState};
use shelterbot::storage::{create_pool, EntityStore, ShelterCatalog, SqliteStore};
use tempfile::TempDir;

fn open_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelter.sqlite");
    let pool = create_pool(path.to_str().unwrap()).unwrap();
    (dir, SqliteStore::new(Arc::new(pool)))
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

#[tokio::test]
async fn test_create_user_is_idempotent_per_chat() {
    let (_dir, store) = open_store();

    let first = store.create_user(42, Some("Ann".to_string())).await.unwrap();
    let again = store.create_user(42, Some("Someone else".to_string())).await.unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(again.name.as_deref(), Some("Ann"));
    assert_eq!(again.state, UserState::Search);
    assert!(!again.is_volunteer);
    assert_eq!(store.find_user_by_chat_id(42).await.unwrap(), Some(first));
}

#[tokio::test]
async fn test_stale_save_is_a_conflict() {
    let (_dir, store) = open_store();
    let user = store.create_user(42, None).await.unwrap();

    let mut edited = user.clone();
    edited.phone = Some("+7 900 123 45 67".to_string());
    let saved = store.save_user(&edited).await.unwrap();
    assert_eq!(saved.version, user.version + 1);

    // `user` still carries the old version
    let mut stale = user.clone();
    stale.email = Some("ann@example.org".to_string());
    match store.save_user(&stale).await {
        Err(AppError::Conflict { entity, id }) => {
            assert_eq!(entity, "user");
            assert_eq!(id, user.id);
        }
        other => panic!("expected a conflict, got {:?}", other),
    }

    let stored = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.phone.as_deref(), Some("+7 900 123 45 67"));
    assert!(stored.email.is_none());
}

#[tokio::test]
async fn test_saving_a_missing_record_is_not_found() {
    let (_dir, store) = open_store();
    let mut ghost = store.create_user(42, None).await.unwrap();
    ghost.id = 9_999;

    assert!(matches!(store.save_user(&ghost).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_user_fields_round_trip() {
    let (_dir, store) = open_store();
    let mut user = store.create_user(42, Some("Ann".to_string())).await.unwrap();
    let end_test = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    user.state = UserState::Probation;
    user.end_test = Some(end_test);
    user.is_volunteer = true;
    user.surname = Some("Lee".to_string());

    store.save_user(&user).await.unwrap();
    let stored = store.find_user(user.id).await.unwrap().unwrap();

    assert_eq!(stored.state, UserState::Probation);
    assert_eq!(stored.end_test, Some(end_test));
    assert!(stored.is_volunteer);
    assert_eq!(store.find_volunteers().await.unwrap().len(), 1);
    assert_eq!(store.find_users_by_state(UserState::Probation).await.unwrap().len(), 1);
    assert!(store.find_users_by_state(UserState::Accepted).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_animal_queries_follow_the_adopter() {
    let (_dir, store) = open_store();
    let mut accepted = store.create_user(1, None).await.unwrap();
    accepted.state = UserState::Accepted;
    let accepted = store.save_user(&accepted).await.unwrap();
    let searching = store.create_user(2, None).await.unwrap();

    let rex = store
        .insert_animal(Animal {
            id: 0,
            name: "Rex".to_string(),
            breed: Some("Beagle".to_string()),
            state: AnimalState::InTest,
            user_id: Some(accepted.id),
            version: 0,
        })
        .await
        .unwrap();
    store
        .insert_animal(Animal {
            id: 0,
            name: "Tom".to_string(),
            breed: None,
            state: AnimalState::InTest,
            user_id: Some(searching.id),
            version: 0,
        })
        .await
        .unwrap();
    store
        .insert_animal(Animal {
            id: 0,
            name: "Stray".to_string(),
            breed: None,
            state: AnimalState::InShelter,
            user_id: None,
            version: 0,
        })
        .await
        .unwrap();

    let of_accepted = store.find_animals_by_user_state(UserState::Accepted).await.unwrap();
    assert_eq!(of_accepted, vec![rex.clone()]);
    assert_eq!(store.find_animal(rex.id).await.unwrap(), Some(rex.clone()));

    let in_test: Vec<String> = store
        .find_animals_in_test_with_user()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(in_test, vec!["Rex".to_string(), "Tom".to_string()]);

    let mut placed = rex.clone();
    placed.state = AnimalState::HappyEnd;
    let saved = store.save_animal(&placed).await.unwrap();
    assert_eq!(saved.version, 1);
    assert!(matches!(
        store.save_animal(&placed).await,
        Err(AppError::Conflict { entity: "animal", .. })
    ));
}

#[tokio::test]
async fn test_one_report_per_user_and_day() {
    let (_dir, store) = open_store();
    let user = store.create_user(42, None).await.unwrap();

    let mut first = store.find_or_create_todays_report(&user, day(10)).await.unwrap();
    let submitted_at = Utc.with_ymd_and_hms(2024, 5, 10, 20, 15, 0).unwrap();
    first.diet = Some("kibble".to_string());
    first.photo = Some(vec![1, 2, 3]);
    first.submitted_at = submitted_at;
    store.save_report(&first).await.unwrap();

    let same = store.find_or_create_todays_report(&user, day(10)).await.unwrap();
    assert_eq!(same.id, first.id);
    assert_eq!(same.diet.as_deref(), Some("kibble"));
    assert_eq!(same.photo, Some(vec![1, 2, 3]));
    assert_eq!(same.submitted_at, submitted_at);

    let next_day = store.find_or_create_todays_report(&user, day(11)).await.unwrap();
    assert_ne!(next_day.id, first.id);
    assert!(next_day.diet.is_none());
}

#[tokio::test]
async fn test_reports_by_animal() {
    let (_dir, store) = open_store();
    let mut user = store.create_user(42, None).await.unwrap();
    let rex = store
        .insert_animal(Animal {
            id: 0,
            name: "Rex".to_string(),
            breed: None,
            state: AnimalState::InTest,
            user_id: Some(user.id),
            version: 0,
        })
        .await
        .unwrap();
    user.animal_id = Some(rex.id);
    let user = store.save_user(&user).await.unwrap();

    let today = day(20);
    for offset in [3, 2, 0] {
        store
            .find_or_create_todays_report(&user, today - Duration::days(offset))
            .await
            .unwrap();
    }

    let reports = store.find_reports_by_animal(rex.id).await.unwrap();
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.animal_id == Some(rex.id)));
    assert!(reports.iter().any(|r| r.date == today));
}

#[tokio::test]
async fn test_shelter_info_is_kept_as_json() {
    let (_dir, store) = open_store();
    let mut info = BTreeMap::new();
    info.insert(InfoTopic::About, "Since 2010".to_string());
    info.insert(InfoTopic::Contacts, "+7 900 000 00 00".to_string());

    let stored = store
        .insert_shelter(Shelter {
            id: 0,
            name: "Whiskers".to_string(),
            kind: ShelterKind::Cats,
            info,
        })
        .await
        .unwrap();

    let loaded = store.find_shelter(stored.id).await.unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(loaded.info(InfoTopic::About), Some("Since 2010"));
    assert_eq!(loaded.info(InfoTopic::Documents), None);

    assert_eq!(store.list_shelters().await.unwrap(), vec![stored]);
    assert!(store.find_shelter(loaded.id + 1).await.unwrap().is_none());
}
