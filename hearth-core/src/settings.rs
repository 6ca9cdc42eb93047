//! Singleton configuration documents
//!
//! `Settings` and `HeroSettings` are single-row records addressed by a
//! fixed key. They are created on first access through the settings
//! service's get-or-create, so every deployment starts from the defaults
//! below without a seed step.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::lockout::LockoutPolicy;

/// The fixed row key both singletons live under.
pub const SINGLETON_KEY: &str = "default";

/// Security thresholds, consulted by the lockout and session services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Failed logins per `(email, ip)` pair before lockout.
    pub max_login_attempts: u32,
    pub lockout_duration_minutes: u32,
    pub session_lifetime_days: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout_duration_minutes: 30,
            session_lifetime_days: 30,
        }
    }
}

impl SecuritySettings {
    /// The lockout policy these settings describe.
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: self.max_login_attempts,
            lockout_duration: Duration::minutes(i64::from(self.lockout_duration_minutes)),
        }
    }
}

/// Listing moderation knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSettings {
    /// When true, new listings start `Pending` until approved.
    pub require_approval: bool,
    pub max_images_per_listing: u32,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            require_approval: true,
            max_images_per_listing: 20,
        }
    }
}

/// The global marketplace configuration singleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub security: SecuritySettings,
    pub listings: ListingSettings,
}

/// The landing-page hero singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSettings {
    pub headline: String,
    pub tagline: String,
    pub image_url: Option<String>,
    pub search_placeholder: String,
}

impl Default for HeroSettings {
    fn default() -> Self {
        Self {
            headline: "Find your next home".to_string(),
            tagline: "Browse listings from trusted vendors".to_string(),
            image_url: None,
            search_placeholder: "City, neighborhood or address".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lockout_policy() {
        let policy = SecuritySettings::default().lockout_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.lockout_duration, Duration::minutes(30));
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }
}
