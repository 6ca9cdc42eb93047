//! Core functionality for the Hearth marketplace backend.
//!
//! This crate contains the domain models, validation rules, repository
//! traits and service implementations shared by every Hearth storage
//! backend and integration crate.
//!
//! The layering is intentionally strict: models carry data and pure
//! invariants, repositories abstract persistence, and services hold the
//! business logic that composes the two. Application code should depend on
//! the `hearth` facade crate rather than on this crate directly.

pub mod error;
pub mod id;
pub mod lockout;
pub mod notification;
pub mod promotion;
pub mod property;
pub mod repositories;
pub mod services;
pub mod session;
pub mod settings;
pub mod subscription;
pub mod support;
pub mod user;
pub mod validation;
pub mod vendor;

pub use error::Error;
pub use lockout::{LoginAttempt, LockoutPolicy, LockoutStatus};
pub use notification::{
    Notification, NotificationRecipient, NotificationStatistics, NotificationStatus,
};
pub use promotion::{PromotionRequest, PromotionStatus};
pub use property::{
    FieldDefinition, FieldKind, ListingKind, Property, PropertyStatus, PropertyType,
};
pub use repositories::{Page, PageRequest, RepositoryProvider};
pub use session::{Session, SessionToken};
pub use settings::{HeroSettings, Settings};
pub use subscription::{Addon, Subscription, SubscriptionPlan, SubscriptionStatus};
pub use support::{SupportTicket, TicketPriority, TicketReply, TicketStatus};
pub use user::{NewUser, User, UserId, UserRole};
pub use vendor::{BookingStatus, Review, ServiceBooking, ServiceStatistics, VendorService};
