//! Repository traits for the data access layer
//!
//! These traits define the storage interface the services are written
//! against. The hierarchy is composable:
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits plus
//!   lifecycle methods
//!
//! A storage backend implements each repository, each provider, and the
//! unified `RepositoryProvider` with `migrate()` and `health_check()`.

pub mod adapter;
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

pub use adapter::{
    LockoutRepositoryAdapter, NotificationRepositoryAdapter, PasswordRepositoryAdapter,
    PromotionRepositoryAdapter, PropertyRepositoryAdapter, SessionRepositoryAdapter,
    SettingsRepositoryAdapter, SubscriptionRepositoryAdapter, SupportRepositoryAdapter,
    UserRepositoryAdapter, VendorRepositoryAdapter,
};
pub use lockout::LockoutRepository;
pub use notification::NotificationRepository;
pub use password::PasswordRepository;
pub use promotion::PromotionRepository;
pub use property::{PropertyFilter, PropertyRepository};
pub use session::SessionRepository;
pub use settings::SettingsRepository;
pub use subscription::SubscriptionRepository;
pub use support::SupportRepository;
pub use user::UserRepository;
pub use vendor::VendorRepository;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A pagination request in the `page`/`per_page` convention.
///
/// Pages are 1-based. Out-of-range values are clamped so every listing
/// endpoint behaves identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
        }
    }

    /// Total number of pages at the current page size.
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

// ============================================================================
// Individual Repository Provider Traits
// ============================================================================

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    /// The user repository implementation type
    type UserRepo: UserRepository;

    /// Get the user repository
    fn user(&self) -> &Self::UserRepo;
}

/// Provider trait for session repository access.
pub trait SessionRepositoryProvider: Send + Sync + 'static {
    /// The session repository implementation type
    type SessionRepo: SessionRepository;

    /// Get the session repository
    fn session(&self) -> &Self::SessionRepo;
}

/// Provider trait for password repository access.
pub trait PasswordRepositoryProvider: Send + Sync + 'static {
    /// The password repository implementation type
    type PasswordRepo: PasswordRepository;

    /// Get the password repository
    fn password(&self) -> &Self::PasswordRepo;
}

/// Provider trait for lockout repository access.
pub trait LockoutRepositoryProvider: Send + Sync + 'static {
    /// The lockout repository implementation type
    type LockoutRepo: LockoutRepository;

    /// Get the lockout repository
    fn lockout(&self) -> &Self::LockoutRepo;
}

/// Provider trait for notification repository access.
pub trait NotificationRepositoryProvider: Send + Sync + 'static {
    /// The notification repository implementation type
    type NotificationRepo: NotificationRepository;

    /// Get the notification repository
    fn notification(&self) -> &Self::NotificationRepo;
}

/// Provider trait for property repository access.
pub trait PropertyRepositoryProvider: Send + Sync + 'static {
    /// The property repository implementation type
    type PropertyRepo: PropertyRepository;

    /// Get the property repository
    fn property(&self) -> &Self::PropertyRepo;
}

/// Provider trait for subscription repository access.
pub trait SubscriptionRepositoryProvider: Send + Sync + 'static {
    /// The subscription repository implementation type
    type SubscriptionRepo: SubscriptionRepository;

    /// Get the subscription repository
    fn subscription(&self) -> &Self::SubscriptionRepo;
}

/// Provider trait for support ticket repository access.
pub trait SupportRepositoryProvider: Send + Sync + 'static {
    /// The support repository implementation type
    type SupportRepo: SupportRepository;

    /// Get the support repository
    fn support(&self) -> &Self::SupportRepo;
}

/// Provider trait for vendor service repository access.
pub trait VendorRepositoryProvider: Send + Sync + 'static {
    /// The vendor repository implementation type
    type VendorRepo: VendorRepository;

    /// Get the vendor repository
    fn vendor(&self) -> &Self::VendorRepo;
}

/// Provider trait for settings repository access.
pub trait SettingsRepositoryProvider: Send + Sync + 'static {
    /// The settings repository implementation type
    type SettingsRepo: SettingsRepository;

    /// Get the settings repository
    fn settings(&self) -> &Self::SettingsRepo;
}

/// Provider trait for promotion repository access.
pub trait PromotionRepositoryProvider: Send + Sync + 'static {
    /// The promotion repository implementation type
    type PromotionRepo: PromotionRepository;

    /// Get the promotion repository
    fn promotion(&self) -> &Self::PromotionRepo;
}

// ============================================================================
// Unified Repository Provider Trait
// ============================================================================

/// Provider trait that storage implementations must implement to provide all
/// repositories.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement `RepositoryProvider` with `migrate()` and `health_check()`
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider
    + SessionRepositoryProvider
    + PasswordRepositoryProvider
    + LockoutRepositoryProvider
    + NotificationRepositoryProvider
    + PropertyRepositoryProvider
    + SubscriptionRepositoryProvider
    + SupportRepositoryProvider
    + VendorRepositoryProvider
    + SettingsRepositoryProvider
    + PromotionRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, 1);

        let request = PageRequest::new(3, 1000);
        assert_eq!(request.per_page, PageRequest::MAX_PER_PAGE);
        assert_eq!(request.offset(), 200);
    }

    #[test]
    fn test_page_total_pages() {
        let page = Page::new(vec![1, 2, 3], 41, PageRequest::default());
        assert_eq!(page.total_pages(), 3);

        let page: Page<i32> = Page::new(vec![], 0, PageRequest::default());
        assert_eq!(page.total_pages(), 0);
    }
}
