//! Repository implementations for SQLite storage

pub mod lockout;
pub mod notification;
pub mod password;
pub mod promotion;
pub mod property;
pub mod session;
pub mod settings;
pub mod subscription;
pub mod support;
pub mod user;
pub mod vendor;

pub use lockout::SqliteLockoutRepository;
pub use notification::SqliteNotificationRepository;
pub use password::SqlitePasswordRepository;
pub use promotion::SqlitePromotionRepository;
pub use property::SqlitePropertyRepository;
pub use session::SqliteSessionRepository;
pub use settings::SqliteSettingsRepository;
pub use subscription::SqliteSubscriptionRepository;
pub use support::SqliteSupportRepository;
pub use user::SqliteUserRepository;
pub use vendor::SqliteVendorRepository;

use async_trait::async_trait;
use hearth_core::{
    Error,
    error::StorageError,
    repositories::{
        LockoutRepositoryProvider, NotificationRepositoryProvider, PasswordRepositoryProvider,
        PromotionRepositoryProvider, PropertyRepositoryProvider, RepositoryProvider,
        SessionRepositoryProvider, SettingsRepositoryProvider, SubscriptionRepositoryProvider,
        SupportRepositoryProvider, UserRepositoryProvider, VendorRepositoryProvider,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Repository provider implementation for SQLite
///
/// This struct implements all the individual repository provider traits
/// as well as the unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    user: Arc<SqliteUserRepository>,
    session: Arc<SqliteSessionRepository>,
    password: Arc<SqlitePasswordRepository>,
    lockout: Arc<SqliteLockoutRepository>,
    notification: Arc<SqliteNotificationRepository>,
    property: Arc<SqlitePropertyRepository>,
    subscription: Arc<SqliteSubscriptionRepository>,
    support: Arc<SqliteSupportRepository>,
    vendor: Arc<SqliteVendorRepository>,
    settings: Arc<SqliteSettingsRepository>,
    promotion: Arc<SqlitePromotionRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let user = Arc::new(SqliteUserRepository::new(pool.clone()));
        let session = Arc::new(SqliteSessionRepository::new(pool.clone()));
        let password = Arc::new(SqlitePasswordRepository::new(pool.clone()));
        let lockout = Arc::new(SqliteLockoutRepository::new(pool.clone()));
        let notification = Arc::new(SqliteNotificationRepository::new(pool.clone()));
        let property = Arc::new(SqlitePropertyRepository::new(pool.clone()));
        let subscription = Arc::new(SqliteSubscriptionRepository::new(pool.clone()));
        let support = Arc::new(SqliteSupportRepository::new(pool.clone()));
        let vendor = Arc::new(SqliteVendorRepository::new(pool.clone()));
        let settings = Arc::new(SqliteSettingsRepository::new(pool.clone()));
        let promotion = Arc::new(SqlitePromotionRepository::new(pool.clone()));

        Self {
            pool,
            user,
            session,
            password,
            lockout,
            notification,
            property,
            subscription,
            support,
            vendor,
            settings,
            promotion,
        }
    }
}

// Implement individual provider traits

impl UserRepositoryProvider for SqliteRepositoryProvider {
    type UserRepo = SqliteUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl SessionRepositoryProvider for SqliteRepositoryProvider {
    type SessionRepo = SqliteSessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

impl PasswordRepositoryProvider for SqliteRepositoryProvider {
    type PasswordRepo = SqlitePasswordRepository;

    fn password(&self) -> &Self::PasswordRepo {
        &self.password
    }
}

impl LockoutRepositoryProvider for SqliteRepositoryProvider {
    type LockoutRepo = SqliteLockoutRepository;

    fn lockout(&self) -> &Self::LockoutRepo {
        &self.lockout
    }
}

impl NotificationRepositoryProvider for SqliteRepositoryProvider {
    type NotificationRepo = SqliteNotificationRepository;

    fn notification(&self) -> &Self::NotificationRepo {
        &self.notification
    }
}

impl PropertyRepositoryProvider for SqliteRepositoryProvider {
    type PropertyRepo = SqlitePropertyRepository;

    fn property(&self) -> &Self::PropertyRepo {
        &self.property
    }
}

impl SubscriptionRepositoryProvider for SqliteRepositoryProvider {
    type SubscriptionRepo = SqliteSubscriptionRepository;

    fn subscription(&self) -> &Self::SubscriptionRepo {
        &self.subscription
    }
}

impl SupportRepositoryProvider for SqliteRepositoryProvider {
    type SupportRepo = SqliteSupportRepository;

    fn support(&self) -> &Self::SupportRepo {
        &self.support
    }
}

impl VendorRepositoryProvider for SqliteRepositoryProvider {
    type VendorRepo = SqliteVendorRepository;

    fn vendor(&self) -> &Self::VendorRepo {
        &self.vendor
    }
}

impl SettingsRepositoryProvider for SqliteRepositoryProvider {
    type SettingsRepo = SqliteSettingsRepository;

    fn settings(&self) -> &Self::SettingsRepo {
        &self.settings
    }
}

impl PromotionRepositoryProvider for SqliteRepositoryProvider {
    type PromotionRepo = SqlitePromotionRepository;

    fn promotion(&self) -> &Self::PromotionRepo {
        &self.promotion
    }
}

// Implement the unified RepositoryProvider trait

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        use crate::migrations::{SqliteMigrationManager, all_migrations};
        use hearth_migration::MigrationManager;

        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&all_migrations()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
