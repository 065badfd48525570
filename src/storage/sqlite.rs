//! SQLite-backed entity store.
//!
//! Every call checks a connection out of the r2d2 pool on the blocking thread
//! pool. Updates are guarded by the `version` column, so a save built from a
//! stale read affects zero rows and is reported as a conflict.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::core::{AppError, AppResult, Animal, AnimalState, Report, Shelter, ShelterKind, User, UserState};
use crate::storage::db::{get_connection, DbConnection, DbPool};
use crate::storage::store::{EntityStore, ShelterCatalog};

const USER_COLUMNS: &str =
    "id, chat_id, name, surname, phone, email, state, end_test, is_volunteer, animal_id, shelter_id, version";
const ANIMAL_COLUMNS: &str = "id, name, breed, state, user_id, version";
const REPORT_COLUMNS: &str = "id, animal_id, user_id, date, submitted_at, diet, behavior, wellbeing, photo, version";

/// Parses a strum-encoded text column.
fn parse_column<T: FromStr>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    T::from_str(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        name: row.get(2)?,
        surname: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        state: parse_column(row, 6)?,
        end_test: row.get::<_, Option<DateTime<Utc>>>(7)?,
        is_volunteer: row.get::<_, i32>(8)? != 0,
        animal_id: row.get(9)?,
        shelter_id: row.get(10)?,
        version: row.get(11)?,
    })
}

fn animal_from_row(row: &Row) -> rusqlite::Result<Animal> {
    Ok(Animal {
        id: row.get(0)?,
        name: row.get(1)?,
        breed: row.get(2)?,
        state: parse_column(row, 3)?,
        user_id: row.get(4)?,
        version: row.get(5)?,
    })
}

fn report_from_row(row: &Row) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        animal_id: row.get(1)?,
        user_id: row.get(2)?,
        date: row.get::<_, NaiveDate>(3)?,
        submitted_at: row.get::<_, DateTime<Utc>>(4)?,
        diet: row.get(5)?,
        behavior: row.get(6)?,
        wellbeing: row.get(7)?,
        photo: row.get(8)?,
        version: row.get(9)?,
    })
}

fn shelter_from_row(row: &Row) -> rusqlite::Result<Shelter> {
    let info: String = row.get(3)?;
    Ok(Shelter {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: parse_column::<ShelterKind>(row, 2)?,
        info: serde_json::from_str(&info)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?,
    })
}

/// Resolves a zero-row versioned update into `NotFound` or `Conflict`.
fn missed_update(conn: &DbConnection, table: &str, entity: &'static str, id: i64) -> AppError {
    let sql = format!("SELECT version FROM {} WHERE id = ?1", table);
    match conn.query_row(&sql, params![id], |row| row.get::<_, i64>(0)).optional() {
        Ok(Some(_)) => AppError::Conflict { entity, id },
        Ok(None) => AppError::not_found(format!("{} #{}", entity, id)),
        Err(e) => AppError::Database(e),
    }
}

/// Entity store persisted in SQLite through the shared r2d2 pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<DbPool>,
}

impl SqliteStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut DbConnection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection(&pool)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| AppError::Anyhow(anyhow::anyhow!("database task failed: {}", e)))?
    }

    /// Inserts a shelter (administrative seeding; the bot never writes shelters).
    pub async fn insert_shelter(&self, shelter: Shelter) -> AppResult<Shelter> {
        self.with_conn(move |conn| {
            let info = serde_json::to_string(&shelter.info)?;
            conn.execute(
                "INSERT INTO shelters (name, kind, info) VALUES (?1, ?2, ?3)",
                params![shelter.name, shelter.kind.to_string(), info],
            )?;
            Ok(Shelter {
                id: conn.last_insert_rowid(),
                ..shelter
            })
        })
        .await
    }

    /// Inserts an animal (adoption linkage is managed outside the bot).
    pub async fn insert_animal(&self, animal: Animal) -> AppResult<Animal> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO animals (name, breed, state, user_id) VALUES (?1, ?2, ?3, ?4)",
                params![animal.name, animal.breed, animal.state.to_string(), animal.user_id],
            )?;
            Ok(Animal {
                id: conn.last_insert_rowid(),
                version: 0,
                ..animal
            })
        })
        .await
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
            Ok(conn.query_row(&sql, params![id], user_from_row).optional()?)
        })
        .await
    }

    async fn find_user_by_chat_id(&self, chat_id: i64) -> AppResult<Option<User>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM users WHERE chat_id = ?1", USER_COLUMNS);
            Ok(conn.query_row(&sql, params![chat_id], user_from_row).optional()?)
        })
        .await
    }

    async fn create_user(&self, chat_id: i64, name: Option<String>) -> AppResult<User> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO users (chat_id, name, state) VALUES (?1, ?2, ?3) ON CONFLICT(chat_id) DO NOTHING",
                params![chat_id, name, UserState::Search.to_string()],
            )?;
            let sql = format!("SELECT {} FROM users WHERE chat_id = ?1", USER_COLUMNS);
            Ok(conn.query_row(&sql, params![chat_id], user_from_row)?)
        })
        .await
    }

    async fn find_users_by_state(&self, state: UserState) -> AppResult<Vec<User>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM users WHERE state = ?1 ORDER BY id", USER_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![state.to_string()], user_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn find_volunteers(&self) -> AppResult<Vec<User>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM users WHERE is_volunteer = 1 ORDER BY id", USER_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], user_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn find_animal(&self, id: i64) -> AppResult<Option<Animal>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM animals WHERE id = ?1", ANIMAL_COLUMNS);
            Ok(conn.query_row(&sql, params![id], animal_from_row).optional()?)
        })
        .await
    }

    async fn find_animals_by_user_state(&self, state: UserState) -> AppResult<Vec<Animal>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM animals WHERE user_id IN (SELECT id FROM users WHERE state = ?1) ORDER BY id",
                ANIMAL_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![state.to_string()], animal_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn find_animals_in_test_with_user(&self) -> AppResult<Vec<Animal>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM animals WHERE state = ?1 AND user_id IS NOT NULL ORDER BY id",
                ANIMAL_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![AnimalState::InTest.to_string()], animal_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn find_reports_by_animal(&self, animal_id: i64) -> AppResult<Vec<Report>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM reports WHERE animal_id = ?1 ORDER BY id", REPORT_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![animal_id], report_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn find_or_create_todays_report(&self, user: &User, date: NaiveDate) -> AppResult<Report> {
        let user_id = user.id;
        let animal_id = user.animal_id;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let sql = format!(
                "SELECT {} FROM reports WHERE user_id = ?1 AND date = ?2 ORDER BY id LIMIT 1",
                REPORT_COLUMNS
            );
            let existing = tx.query_row(&sql, params![user_id, date], report_from_row).optional()?;
            let report = match existing {
                Some(report) => report,
                None => {
                    let submitted_at = Utc::now();
                    tx.execute(
                        "INSERT INTO reports (animal_id, user_id, date, submitted_at) VALUES (?1, ?2, ?3, ?4)",
                        params![animal_id, user_id, date, submitted_at],
                    )?;
                    Report {
                        id: tx.last_insert_rowid(),
                        animal_id,
                        user_id,
                        date,
                        submitted_at,
                        diet: None,
                        behavior: None,
                        wellbeing: None,
                        photo: None,
                        version: 0,
                    }
                }
            };
            tx.commit()?;
            Ok(report)
        })
        .await
    }

    async fn save_user(&self, user: &User) -> AppResult<User> {
        let user = user.clone();
        self.with_conn(move |conn| {
            let updated = conn.execute(
                "UPDATE users SET chat_id = ?1, name = ?2, surname = ?3, phone = ?4, email = ?5, state = ?6,
                    end_test = ?7, is_volunteer = ?8, animal_id = ?9, shelter_id = ?10, version = version + 1
                 WHERE id = ?11 AND version = ?12",
                params![
                    user.chat_id,
                    user.name,
                    user.surname,
                    user.phone,
                    user.email,
                    user.state.to_string(),
                    user.end_test,
                    user.is_volunteer,
                    user.animal_id,
                    user.shelter_id,
                    user.id,
                    user.version
                ],
            )?;
            if updated == 0 {
                return Err(missed_update(conn, "users", "user", user.id));
            }
            Ok(User {
                version: user.version + 1,
                ..user
            })
        })
        .await
    }

    async fn save_animal(&self, animal: &Animal) -> AppResult<Animal> {
        let animal = animal.clone();
        self.with_conn(move |conn| {
            let updated = conn.execute(
                "UPDATE animals SET name = ?1, breed = ?2, state = ?3, user_id = ?4, version = version + 1
                 WHERE id = ?5 AND version = ?6",
                params![
                    animal.name,
                    animal.breed,
                    animal.state.to_string(),
                    animal.user_id,
                    animal.id,
                    animal.version
                ],
            )?;
            if updated == 0 {
                return Err(missed_update(conn, "animals", "animal", animal.id));
            }
            Ok(Animal {
                version: animal.version + 1,
                ..animal
            })
        })
        .await
    }

    async fn save_report(&self, report: &Report) -> AppResult<Report> {
        let report = report.clone();
        self.with_conn(move |conn| {
            let updated = conn.execute(
                "UPDATE reports SET animal_id = ?1, user_id = ?2, date = ?3, submitted_at = ?4, diet = ?5,
                    behavior = ?6, wellbeing = ?7, photo = ?8, version = version + 1
                 WHERE id = ?9 AND version = ?10",
                params![
                    report.animal_id,
                    report.user_id,
                    report.date,
                    report.submitted_at,
                    report.diet,
                    report.behavior,
                    report.wellbeing,
                    report.photo,
                    report.id,
                    report.version
                ],
            )?;
            if updated == 0 {
                return Err(missed_update(conn, "reports", "report", report.id));
            }
            Ok(Report {
                version: report.version + 1,
                ..report
            })
        })
        .await
    }
}

#[async_trait]
impl ShelterCatalog for SqliteStore {
    async fn find_shelter(&self, id: i64) -> AppResult<Option<Shelter>> {
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, kind, info FROM shelters WHERE id = ?1",
                    params![id],
                    shelter_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn list_shelters(&self) -> AppResult<Vec<Shelter>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT id, name, kind, info FROM shelters ORDER BY id")?;
            let rows = stmt.query_map([], shelter_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }
}
