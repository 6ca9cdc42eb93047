//! SQLite implementation of the lockout repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{Error, lockout::LoginAttempt, repositories::LockoutRepository};
use sqlx::SqlitePool;

use crate::{datetime_from_timestamp, optional_datetime_from_timestamp, storage_error};

/// SQLite repository for per-`(email, ip_address)` login counters.
pub struct SqliteLockoutRepository {
    pool: SqlitePool,
}

impl SqliteLockoutRepository {
    /// Create a new SQLite lockout repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteLoginAttempt {
    id: i64,
    email: String,
    ip_address: String,
    user_agent: Option<String>,
    attempts: i64,
    is_locked: bool,
    locked_until: Option<i64>,
    last_attempt: i64,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteLoginAttempt> for LoginAttempt {
    type Error = Error;

    fn try_from(row: SqliteLoginAttempt) -> Result<Self, Error> {
        Ok(LoginAttempt {
            id: row.id,
            email: row.email,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            attempts: row.attempts as u32,
            is_locked: row.is_locked,
            locked_until: optional_datetime_from_timestamp(row.locked_until)?,
            last_attempt: datetime_from_timestamp(row.last_attempt)?,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

const ATTEMPT_COLUMNS: &str = "id, email, ip_address, user_agent, attempts, is_locked, \
     locked_until, last_attempt, created_at, updated_at";

#[async_trait]
impl LockoutRepository for SqliteLockoutRepository {
    async fn find(&self, email: &str, ip_address: &str) -> Result<Option<LoginAttempt>, Error> {
        let row = sqlx::query_as::<_, SqliteLoginAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM login_attempts WHERE email = ?1 AND ip_address = ?2"
        ))
        .bind(email)
        .bind(ip_address)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get login attempts"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn record_failure(
        &self,
        email: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<LoginAttempt, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteLoginAttempt>(&format!(
            r#"
            INSERT INTO login_attempts (email, ip_address, user_agent, attempts, last_attempt, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4, ?4)
            ON CONFLICT(email, ip_address) DO UPDATE SET
                attempts = attempts + 1,
                user_agent = excluded.user_agent,
                last_attempt = excluded.last_attempt,
                updated_at = excluded.updated_at
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(ip_address)
        .bind(user_agent)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to record failed login attempt"))?;

        row.try_into()
    }

    async fn lock(
        &self,
        email: &str,
        ip_address: &str,
        locked_until: DateTime<Utc>,
    ) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE login_attempts
            SET is_locked = 1, locked_until = ?1, updated_at = ?2
            WHERE email = ?3 AND ip_address = ?4
            "#,
        )
        .bind(locked_until.timestamp())
        .bind(now)
        .bind(email)
        .bind(ip_address)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to lock login pair"))?;

        Ok(())
    }

    async fn reset(&self, email: &str, ip_address: &str) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        // A no-op for unknown pairs
        sqlx::query(
            r#"
            UPDATE login_attempts
            SET attempts = 0, is_locked = 0, locked_until = NULL, updated_at = ?1
            WHERE email = ?2 AND ip_address = ?3
            "#,
        )
        .bind(now)
        .bind(email)
        .bind(ip_address)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to reset login attempts"))?;

        Ok(())
    }

    async fn cleanup_stale(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        // Locked pairs are kept so cleanup can never unlock early
        let result = sqlx::query(
            r#"
            DELETE FROM login_attempts
            WHERE last_attempt < ?1 AND is_locked = 0
            "#,
        )
        .bind(before.timestamp())
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to clean up login attempts"))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{SqliteMigrationManager, all_migrations};
    use chrono::Duration;
    use hearth_migration::MigrationManager;
    use sqlx::SqlitePool;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create pool");
        let manager = SqliteMigrationManager::new(pool.clone());
        manager.initialize().await.expect("Failed to initialize");
        manager
            .up(&all_migrations())
            .await
            .expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_record_failure_creates_and_increments() {
        let repo = SqliteLockoutRepository::new(setup_test_db().await);

        let first = repo
            .record_failure("bob@example.com", "1.2.3.4", Some("curl/8"))
            .await
            .unwrap();
        assert_eq!(first.attempts, 1);
        assert!(!first.is_locked);
        assert_eq!(first.user_agent.as_deref(), Some("curl/8"));

        let second = repo
            .record_failure("bob@example.com", "1.2.3.4", None)
            .await
            .unwrap();
        assert_eq!(second.attempts, 2);
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn test_pairs_are_separate_rows() {
        let repo = SqliteLockoutRepository::new(setup_test_db().await);

        repo.record_failure("bob@example.com", "1.2.3.4", None)
            .await
            .unwrap();
        repo.record_failure("bob@example.com", "5.6.7.8", None)
            .await
            .unwrap();

        let a = repo.find("bob@example.com", "1.2.3.4").await.unwrap().unwrap();
        let b = repo.find("bob@example.com", "5.6.7.8").await.unwrap().unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.attempts, 1);
        assert_eq!(b.attempts, 1);
    }

    #[tokio::test]
    async fn test_lock_and_reset() {
        let repo = SqliteLockoutRepository::new(setup_test_db().await);

        repo.record_failure("bob@example.com", "1.2.3.4", None)
            .await
            .unwrap();

        let until = Utc::now() + Duration::minutes(30);
        repo.lock("bob@example.com", "1.2.3.4", until).await.unwrap();

        let locked = repo.find("bob@example.com", "1.2.3.4").await.unwrap().unwrap();
        assert!(locked.is_locked);
        assert_eq!(locked.locked_until.unwrap().timestamp(), until.timestamp());

        repo.reset("bob@example.com", "1.2.3.4").await.unwrap();

        let reset = repo.find("bob@example.com", "1.2.3.4").await.unwrap().unwrap();
        assert_eq!(reset.attempts, 0);
        assert!(!reset.is_locked);
        assert!(reset.locked_until.is_none());
    }

    #[tokio::test]
    async fn test_reset_unknown_pair_is_noop() {
        let repo = SqliteLockoutRepository::new(setup_test_db().await);
        repo.reset("nobody@example.com", "9.9.9.9").await.unwrap();
        assert!(
            repo.find("nobody@example.com", "9.9.9.9")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_cleanup_spares_locked_rows() {
        let repo = SqliteLockoutRepository::new(setup_test_db().await);

        repo.record_failure("idle@example.com", "1.2.3.4", None)
            .await
            .unwrap();
        repo.record_failure("locked@example.com", "1.2.3.4", None)
            .await
            .unwrap();
        repo.lock(
            "locked@example.com",
            "1.2.3.4",
            Utc::now() + Duration::minutes(30),
        )
        .await
        .unwrap();

        // Cutoff in the future catches every unlocked row
        let removed = repo.cleanup_stale(Utc::now() + Duration::days(1)).await.unwrap();
        assert_eq!(removed, 1);

        assert!(repo.find("idle@example.com", "1.2.3.4").await.unwrap().is_none());
        assert!(
            repo.find("locked@example.com", "1.2.3.4")
                .await
                .unwrap()
                .is_some()
        );
    }
}
