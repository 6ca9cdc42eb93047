//! # Hearth
//!
//! Hearth is a real-estate marketplace backend for Rust applications:
//! property listings with admin-defined dynamic attributes, user and
//! vendor accounts with lockout-protected password login, subscriptions
//! and add-ons, vendor service bookings with denormalized statistics,
//! notification campaigns with delivery statistics, support ticketing and
//! singleton admin configuration.
//!
//! Storage is pluggable: any type implementing
//! `hearth_core::repositories::RepositoryProvider` can back a `Hearth`
//! instance. A SQLite implementation ships behind the `sqlite` feature.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hearth::Hearth;
//! use hearth_storage_sqlite::SqliteRepositoryProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
//!     let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
//!
//!     let hearth = Hearth::new(repositories);
//!     hearth.migrate().await.unwrap();
//! }
//! ```

use std::sync::Arc;

use chrono::Duration;

use hearth_core::{
    error::AuthError,
    repositories::{
        LockoutRepositoryAdapter, NotificationRepositoryAdapter, PasswordRepositoryAdapter,
        PromotionRepositoryAdapter, PropertyRepositoryAdapter, SessionRepositoryAdapter,
        SettingsRepositoryAdapter, SubscriptionRepositoryAdapter, SupportRepositoryAdapter,
        UserRepositoryAdapter, VendorRepositoryAdapter,
    },
    services::{
        BookingService, LockoutService, NotificationService, PasswordService, PromotionService,
        PropertyService, SessionService, SettingsService, SubscriptionService, SupportService,
        UserService,
    },
};

/// Re-export core types from hearth_core
///
/// These types are commonly used when working with the Hearth API.
pub use hearth_core::{
    Error, HeroSettings, ListingKind, LockoutStatus, Notification, NotificationStatus, Page,
    PageRequest, PromotionRequest, Property, PropertyStatus, PropertyType, RepositoryProvider,
    Session, SessionToken, Settings, SupportTicket, User, UserId, UserRole,
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding
/// feature is enabled.
#[cfg(feature = "sqlite")]
pub use hearth_storage_sqlite::SqliteRepositoryProvider;

/// Lockout key used when the client's address is unknown.
///
/// Failed logins without an IP still count against the email, just under
/// one shared bucket.
const UNKNOWN_IP: &str = "unknown";

/// Errors that can occur when using Hearth.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    /// The `(email, ip)` pair is locked out after repeated failures
    #[error("Account locked, retry in {retry_after_minutes} minutes")]
    AccountLocked { retry_after_minutes: i64 },
    /// Error during authentication
    #[error("Auth error: {0}")]
    AuthError(String),
    /// Error when interacting with storage
    #[error("Storage error: {0}")]
    StorageError(String),
}

/// The configuration for a session.
pub struct SessionConfig {
    /// The duration until the session expires
    pub expires_in: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expires_in: Duration::days(30),
        }
    }
}

impl SessionConfig {
    /// Set the session expiration time
    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.expires_in = duration;
        self
    }
}

/// The main marketplace coordinator that wires repositories into services.
///
/// `Hearth` is the central entry point: construct it with a repository
/// provider, run migrations, and use the high-level methods (or the
/// service accessors) to drive the marketplace.
///
/// # Example
///
/// ```rust,no_run
/// use hearth::{Hearth, UserRole};
/// use hearth_storage_sqlite::SqliteRepositoryProvider;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = sqlx::SqlitePool::connect("sqlite::memory:").await?;
///     let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
///
///     let hearth = Hearth::new(repositories);
///     hearth.migrate().await?;
///
///     let user = hearth
///         .register_user_with_password("vendor@example.com", "secure-password", None, UserRole::Vendor)
///         .await?;
///     println!("Registered {}", user.email);
///
///     Ok(())
/// }
/// ```
pub struct Hearth<R: RepositoryProvider> {
    repositories: Arc<R>,
    user_service: Arc<UserService<UserRepositoryAdapter<R>>>,
    session_service: Arc<SessionService<SessionRepositoryAdapter<R>>>,
    password_service:
        Arc<PasswordService<UserRepositoryAdapter<R>, PasswordRepositoryAdapter<R>>>,
    lockout_service: Arc<LockoutService<LockoutRepositoryAdapter<R>, SettingsRepositoryAdapter<R>>>,
    notification_service: Arc<NotificationService<NotificationRepositoryAdapter<R>>>,
    property_service:
        Arc<PropertyService<PropertyRepositoryAdapter<R>, SettingsRepositoryAdapter<R>>>,
    subscription_service: Arc<SubscriptionService<SubscriptionRepositoryAdapter<R>>>,
    support_service: Arc<SupportService<SupportRepositoryAdapter<R>>>,
    booking_service: Arc<BookingService<VendorRepositoryAdapter<R>>>,
    settings_service: Arc<SettingsService<SettingsRepositoryAdapter<R>>>,
    promotion_service:
        Arc<PromotionService<PromotionRepositoryAdapter<R>, PropertyRepositoryAdapter<R>>>,
    session_config: SessionConfig,
}

impl<R: RepositoryProvider> Hearth<R> {
    /// Create a new Hearth instance with a repository provider.
    pub fn new(repositories: Arc<R>) -> Self {
        // Create repository adapters
        let user_repo = Arc::new(UserRepositoryAdapter::new(repositories.clone()));
        let session_repo = Arc::new(SessionRepositoryAdapter::new(repositories.clone()));
        let password_repo = Arc::new(PasswordRepositoryAdapter::new(repositories.clone()));
        let lockout_repo = Arc::new(LockoutRepositoryAdapter::new(repositories.clone()));
        let notification_repo = Arc::new(NotificationRepositoryAdapter::new(repositories.clone()));
        let property_repo = Arc::new(PropertyRepositoryAdapter::new(repositories.clone()));
        let subscription_repo = Arc::new(SubscriptionRepositoryAdapter::new(repositories.clone()));
        let support_repo = Arc::new(SupportRepositoryAdapter::new(repositories.clone()));
        let vendor_repo = Arc::new(VendorRepositoryAdapter::new(repositories.clone()));
        let settings_repo = Arc::new(SettingsRepositoryAdapter::new(repositories.clone()));
        let promotion_repo = Arc::new(PromotionRepositoryAdapter::new(repositories.clone()));

        Self {
            repositories,
            user_service: Arc::new(UserService::new(user_repo.clone())),
            session_service: Arc::new(SessionService::new(session_repo)),
            password_service: Arc::new(PasswordService::new(user_repo, password_repo)),
            lockout_service: Arc::new(LockoutService::new(
                lockout_repo,
                settings_repo.clone(),
            )),
            notification_service: Arc::new(NotificationService::new(notification_repo)),
            property_service: Arc::new(PropertyService::new(
                property_repo.clone(),
                settings_repo.clone(),
            )),
            subscription_service: Arc::new(SubscriptionService::new(subscription_repo)),
            support_service: Arc::new(SupportService::new(support_repo)),
            booking_service: Arc::new(BookingService::new(vendor_repo)),
            settings_service: Arc::new(SettingsService::new(settings_repo)),
            promotion_service: Arc::new(PromotionService::new(promotion_repo, property_repo)),
            session_config: SessionConfig::default(),
        }
    }

    /// Set the session configuration.
    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), HearthError> {
        self.repositories
            .migrate()
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), HearthError> {
        self.repositories
            .health_check()
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))
    }

    // Service accessors

    /// User management operations
    pub fn users(&self) -> &UserService<UserRepositoryAdapter<R>> {
        &self.user_service
    }

    /// Session operations
    pub fn sessions(&self) -> &SessionService<SessionRepositoryAdapter<R>> {
        &self.session_service
    }

    /// Password credential operations
    pub fn passwords(
        &self,
    ) -> &PasswordService<UserRepositoryAdapter<R>, PasswordRepositoryAdapter<R>> {
        &self.password_service
    }

    /// Login lockout bookkeeping
    pub fn lockout(
        &self,
    ) -> &LockoutService<LockoutRepositoryAdapter<R>, SettingsRepositoryAdapter<R>> {
        &self.lockout_service
    }

    /// Notification campaigns and delivery statistics
    pub fn notifications(&self) -> &NotificationService<NotificationRepositoryAdapter<R>> {
        &self.notification_service
    }

    /// Property listings and property types
    pub fn properties(
        &self,
    ) -> &PropertyService<PropertyRepositoryAdapter<R>, SettingsRepositoryAdapter<R>> {
        &self.property_service
    }

    /// Plans, add-ons and subscriptions
    pub fn subscriptions(&self) -> &SubscriptionService<SubscriptionRepositoryAdapter<R>> {
        &self.subscription_service
    }

    /// Support tickets
    pub fn support(&self) -> &SupportService<SupportRepositoryAdapter<R>> {
        &self.support_service
    }

    /// Vendor service offerings, bookings and reviews
    pub fn bookings(&self) -> &BookingService<VendorRepositoryAdapter<R>> {
        &self.booking_service
    }

    /// Global configuration singletons
    pub fn settings(&self) -> &SettingsService<SettingsRepositoryAdapter<R>> {
        &self.settings_service
    }

    /// Listing promotion requests
    pub fn promotions(
        &self,
    ) -> &PromotionService<PromotionRepositoryAdapter<R>, PropertyRepositoryAdapter<R>> {
        &self.promotion_service
    }

    // Convenience methods for the common flows

    /// Get a user by their ID
    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, HearthError> {
        self.user_service
            .get_user(user_id)
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))
    }

    /// Create a new session for a user
    pub async fn create_session(
        &self,
        user_id: &UserId,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<Session, HearthError> {
        self.session_service
            .create_session(
                user_id,
                user_agent,
                ip_address,
                self.session_config.expires_in,
            )
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))
    }

    /// Get a session by its token
    pub async fn get_session(&self, token: &SessionToken) -> Result<Session, HearthError> {
        self.session_service
            .get_session(token)
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))?
            .ok_or(HearthError::StorageError("Session not found".to_string()))
    }

    /// Delete a session by its token
    pub async fn delete_session(&self, token: &SessionToken) -> Result<(), HearthError> {
        self.session_service
            .delete_session(token)
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))
    }

    /// Delete all sessions for a user
    pub async fn delete_sessions_for_user(&self, user_id: &UserId) -> Result<(), HearthError> {
        self.session_service
            .delete_user_sessions(user_id)
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))
    }

    /// Mark a user's email as verified
    pub async fn set_user_email_verified(&self, user_id: &UserId) -> Result<(), HearthError> {
        self.user_service
            .verify_email(user_id)
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))
    }

    /// Delete a user
    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), HearthError> {
        self.user_service
            .delete_user(user_id)
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))
    }

    /// Register a user with a password
    pub async fn register_user_with_password(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
        role: UserRole,
    ) -> Result<User, HearthError> {
        self.password_service
            .register_user(email, password, name, role)
            .await
            .map_err(|e| HearthError::AuthError(e.to_string()))
    }

    /// Login a user with a password, honoring the lockout policy.
    ///
    /// The flow: reject immediately while the `(email, ip)` pair is
    /// locked; otherwise authenticate; on success clear the pair's
    /// counter, on failure record it (which may apply a fresh lock).
    pub async fn login_user_with_password(
        &self,
        email: &str,
        password: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<(User, Session), HearthError> {
        let ip_key = ip_address.as_deref().unwrap_or(UNKNOWN_IP).to_string();

        let status = self
            .lockout_service
            .status(email, &ip_key)
            .await
            .map_err(|e| HearthError::StorageError(e.to_string()))?;
        if status.is_locked {
            return Err(HearthError::AccountLocked {
                retry_after_minutes: status.retry_after_minutes(),
            });
        }

        match self.password_service.authenticate(email, password).await {
            Ok(user) => {
                self.lockout_service
                    .reset(email, &ip_key)
                    .await
                    .map_err(|e| HearthError::StorageError(e.to_string()))?;

                let session = self
                    .create_session(&user.id, user_agent, ip_address)
                    .await?;

                Ok((user, session))
            }
            Err(Error::Auth(AuthError::InvalidCredentials)) => {
                let status = self
                    .lockout_service
                    .record_failure(email, &ip_key, user_agent.as_deref())
                    .await
                    .map_err(|e| HearthError::StorageError(e.to_string()))?;

                if status.is_locked {
                    Err(HearthError::AccountLocked {
                        retry_after_minutes: status.retry_after_minutes(),
                    })
                } else {
                    Err(HearthError::AuthError(
                        Error::Auth(AuthError::InvalidCredentials).to_string(),
                    ))
                }
            }
            Err(e) => Err(HearthError::AuthError(e.to_string())),
        }
    }

    /// Change a user's password and invalidate all existing sessions.
    pub async fn change_user_password(
        &self,
        user_id: &UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), HearthError> {
        self.password_service
            .change_password(user_id, old_password, new_password)
            .await
            .map_err(|e| HearthError::AuthError(e.to_string()))?;

        // Remove all existing sessions for the user.
        self.delete_sessions_for_user(user_id).await?;

        Ok(())
    }
}
