//! Service layer for business logic
//!
//! This module contains concrete service implementations that encapsulate
//! the marketplace logic: account management, lockout-protected
//! authentication, listings, bookings, notifications and configuration.

pub mod booking;
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

pub use booking::BookingService;
pub use lockout::LockoutService;
pub use notification::NotificationService;
pub use password::PasswordService;
pub use promotion::PromotionService;
pub use property::PropertyService;
pub use session::SessionService;
pub use settings::SettingsService;
pub use subscription::SubscriptionService;
pub use support::SupportService;
pub use user::UserService;
