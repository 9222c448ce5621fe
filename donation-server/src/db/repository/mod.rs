//! Repository Module
//!
//! CRUD and lifecycle operations over the embedded SurrealDB tables.

pub mod admin;
pub mod campaign;
pub mod donation;

pub use admin::AdminRepository;
pub use campaign::CampaignRepository;
pub use donation::DonationRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::{Id, Thing};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Build a record id from table and key
pub fn make_thing(table: &str, id: &str) -> Thing {
    Thing::from((table.to_string(), Id::String(id.to_string())))
}

/// Extract the pure key if the id carries a table prefix
/// (e.g. "campaign:xxx" -> "xxx")
pub fn strip_table_prefix<'a>(table: &str, id: &'a str) -> &'a str {
    id.strip_prefix(&format!("{table}:")).unwrap_or(id)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
