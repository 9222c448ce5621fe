//! Admin User Model

use super::serde_thing;
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

/// Back-office administrator account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(default, with = "serde_thing::option")]
    pub id: Option<Thing>,
    pub email: String,
    /// Argon2 hash, never serialized to API responses
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserCreate {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: i64,
}
