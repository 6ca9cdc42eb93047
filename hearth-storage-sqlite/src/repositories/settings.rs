//! SQLite implementation of the settings repository.
//!
//! Each singleton document is one row in the `settings` table, addressed
//! by a fixed key and stored as JSON. `get_or_create` inserts the default
//! document on first access and leaves an existing row untouched, which
//! makes initialization idempotent under concurrent first reads.

use async_trait::async_trait;
use chrono::Utc;
use hearth_core::{
    Error,
    error::StorageError,
    repositories::SettingsRepository,
    settings::{HeroSettings, SINGLETON_KEY, Settings},
};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{Row, SqlitePool};

use crate::storage_error;

/// Row key for the hero singleton.
const HERO_KEY: &str = "hero";

pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_or_create_document<T>(&self, key: &str) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let now = Utc::now().timestamp();
        let default_value = serde_json::to_string(&T::default())
            .map_err(|e| StorageError::Database(format!("Failed to serialize defaults: {e}")))?;

        // Insert the defaults only when no row exists yet
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(default_value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to initialize settings row"))?;

        let row = sqlx::query("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to get settings row"))?;

        let value: String = row.get("value");
        serde_json::from_str(&value).map_err(|e| {
            tracing::error!(error = %e, key, "Corrupt settings row");
            Error::Storage(StorageError::Database("Corrupt settings row".to_string()))
        })
    }

    async fn update_document<T>(&self, key: &str, document: &T) -> Result<T, Error>
    where
        T: Serialize + Clone,
    {
        let now = Utc::now().timestamp();
        let value = serde_json::to_string(document)
            .map_err(|e| StorageError::Database(format!("Failed to serialize settings: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to update settings row"))?;

        Ok(document.clone())
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn get_or_create(&self) -> Result<Settings, Error> {
        self.get_or_create_document(SINGLETON_KEY).await
    }

    async fn update(&self, settings: &Settings) -> Result<Settings, Error> {
        self.update_document(SINGLETON_KEY, settings).await
    }

    async fn get_or_create_hero(&self) -> Result<HeroSettings, Error> {
        self.get_or_create_document(HERO_KEY).await
    }

    async fn update_hero(&self, hero: &HeroSettings) -> Result<HeroSettings, Error> {
        self.update_document(HERO_KEY, hero).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{SqliteMigrationManager, all_migrations};
    use hearth_migration::MigrationManager;

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
    async fn test_get_or_create_returns_defaults_then_same_row() {
        let repo = SqliteSettingsRepository::new(setup_test_db().await);

        let first = repo.get_or_create().await.unwrap();
        assert_eq!(first, Settings::default());

        // Repeated calls observe the same row, not a fresh default
        let second = repo.get_or_create().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_update_persists() {
        let repo = SqliteSettingsRepository::new(setup_test_db().await);

        let mut settings = repo.get_or_create().await.unwrap();
        settings.security.max_login_attempts = 3;
        settings.security.lockout_duration_minutes = 45;
        repo.update(&settings).await.unwrap();

        let reread = repo.get_or_create().await.unwrap();
        assert_eq!(reread.security.max_login_attempts, 3);
        assert_eq!(reread.security.lockout_duration_minutes, 45);
    }

    #[tokio::test]
    async fn test_hero_singleton_is_independent() {
        let repo = SqliteSettingsRepository::new(setup_test_db().await);

        let mut hero = repo.get_or_create_hero().await.unwrap();
        hero.headline = "Summer listings are live".to_string();
        repo.update_hero(&hero).await.unwrap();

        // The main settings row is untouched
        let settings = repo.get_or_create().await.unwrap();
        assert_eq!(settings, Settings::default());

        let reread = repo.get_or_create_hero().await.unwrap();
        assert_eq!(reread.headline, "Summer listings are live");
    }
}
