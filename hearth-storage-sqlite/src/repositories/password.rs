use async_trait::async_trait;
use hearth_core::{Error, UserId, repositories::PasswordRepository};
use sqlx::{Row, SqlitePool};

use crate::storage_error;

pub struct SqlitePasswordRepository {
    pool: SqlitePool,
}

impl SqlitePasswordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordRepository for SqlitePasswordRepository {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(hash)
            .bind(now)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to set password hash"))?;

        Ok(())
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE id = ?1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("Failed to get password hash"))?;

        Ok(row.and_then(|r| r.get("password_hash")))
    }

    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
        sqlx::query("UPDATE users SET password_hash = NULL WHERE id = ?1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to remove password hash"))?;

        Ok(())
    }
}
