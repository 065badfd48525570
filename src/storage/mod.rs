//! Entity persistence: SQLite pool and migrations, the store traits and their implementations.

pub mod db;
pub mod memory;
pub mod migrations;
pub mod sqlite;
pub mod store;

pub use db::{create_pool, get_connection, DbConnection, DbPool};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{EntityStore, ShelterCatalog};
