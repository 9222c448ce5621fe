//! Database Module
//!
//! Embedded SurrealDB (RocksDB engine) bootstrap: connection, namespace
//! selection and first-run seeding.

pub mod models;
pub mod repository;

use crate::auth::hash_password;
use crate::utils::AppError;
use crate::utils::time;
use repository::AdminRepository;
use std::path::Path;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

const NAMESPACE: &str = "donation";
const DATABASE: &str = "donation";

/// Database service owning the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database at `db_path` and prepare it for use
    pub async fn new(db_path: &Path) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::Database(format!("Failed to select namespace: {e}")))?;

        tracing::info!(path = %db_path.display(), "Database connection established");

        let service = Self { db };
        service.define_schema().await?;
        service.seed_default_admin().await?;
        Ok(service)
    }

    /// In-memory database for tests
    #[doc(hidden)]
    pub async fn new_in_memory() -> Result<Self, AppError> {
        let db = Surreal::new::<surrealdb::engine::local::Mem>(())
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {e}")))?;
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::Database(format!("Failed to select namespace: {e}")))?;
        let service = Self { db };
        service.define_schema().await?;
        Ok(service)
    }

    /// Indexes the lifecycle relies on
    async fn define_schema(&self) -> Result<(), AppError> {
        self.db
            .query(
                r#"
                DEFINE INDEX IF NOT EXISTS donation_tran_id ON TABLE donation COLUMNS transaction_id;
                DEFINE INDEX IF NOT EXISTS donation_campaign ON TABLE donation COLUMNS campaign;
                DEFINE INDEX IF NOT EXISTS admin_email ON TABLE admin_user COLUMNS email UNIQUE;
                "#,
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to define schema: {e}")))?;
        Ok(())
    }

    /// Create the initial back-office account on first run
    ///
    /// Credentials come from ADMIN_EMAIL / ADMIN_PASSWORD; the password is
    /// stored as an Argon2 hash only.
    async fn seed_default_admin(&self) -> Result<(), AppError> {
        let repo = AdminRepository::new(self.db.clone());
        let existing = repo
            .count()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if existing > 0 {
            return Ok(());
        }

        let email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.org".to_string());
        let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        let password_hash = hash_password(&password)?;

        repo.create(models::AdminUserCreate {
            email: email.clone(),
            password_hash,
            name: "Administrator".to_string(),
            created_at: time::now_millis(),
        })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(email = %email, "Seeded default admin account");
        Ok(())
    }
}
