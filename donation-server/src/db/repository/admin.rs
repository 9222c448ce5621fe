//! Admin User Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{AdminUser, AdminUserCreate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "admin_user";

#[derive(Clone)]
pub struct AdminRepository {
    base: BaseRepository,
}

impl AdminRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<AdminUser>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM admin_user WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await?;
        let admins: Vec<AdminUser> = result.take(0)?;
        Ok(admins.into_iter().next())
    }

    pub async fn count(&self) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query("SELECT count() FROM admin_user GROUP ALL")
            .await?;
        let count: Option<i64> = result.take((0, "count"))?;
        Ok(count.unwrap_or(0))
    }

    pub async fn create(&self, data: AdminUserCreate) -> RepoResult<AdminUser> {
        if self.find_by_email(&data.email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Admin '{}' already exists",
                data.email
            )));
        }

        let created: Option<AdminUser> = self.base.db().create(TABLE).content(data).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create admin user".to_string()))
    }
}
