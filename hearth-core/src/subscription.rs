//! Subscription plans, add-ons and user subscriptions
//!
//! Plans and add-ons are admin-configured catalog records; a subscription
//! ties a user to a plan for a period. Expiry is lazy: a subscription past
//! `ends_at` reports `Expired` when read, and the service persists that
//! observation explicitly.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    user::UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new(id: &str) -> Self {
        SubscriptionId(id.to_string())
    }

    pub fn new_random() -> Self {
        SubscriptionId(generate_prefixed_id("sub"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "sub")
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for SubscriptionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An admin-configured subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    /// Stable key referenced by subscriptions, e.g. `vendor-pro`.
    pub key: String,
    pub name: String,
    pub price_cents: i64,
    /// Length of one billing period.
    pub period_days: u32,
    /// How many listings may be active at once under this plan.
    pub max_active_listings: u32,
}

/// An admin-configured add-on service, attachable to a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addon {
    pub key: String,
    pub name: String,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown subscription status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's subscription to a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_key: String,
    pub status: SubscriptionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Keys of attached add-ons.
    pub addons: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Start a new subscription to `plan` for one billing period from now.
    pub fn start(user_id: UserId, plan: &SubscriptionPlan) -> Result<Self, Error> {
        if plan.period_days == 0 {
            return Err(ValidationError::InvalidField(
                "Plan period must be at least one day".to_string(),
            )
            .into());
        }
        let now = Utc::now();
        Ok(Self {
            id: SubscriptionId::new_random(),
            user_id,
            plan_key: plan.key.clone(),
            status: SubscriptionStatus::Active,
            starts_at: now,
            ends_at: now + Duration::days(i64::from(plan.period_days)),
            addons: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the period has lapsed at `now`.
    ///
    /// A pure check; the subscription service persists the `Expired`
    /// status explicitly when it observes this.
    pub fn is_period_over(&self, now: DateTime<Utc>) -> bool {
        self.ends_at <= now
    }

    pub fn has_addon(&self, key: &str) -> bool {
        self.addons.iter().any(|a| a == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> SubscriptionPlan {
        SubscriptionPlan {
            key: "vendor-pro".to_string(),
            name: "Vendor Pro".to_string(),
            price_cents: 49_00,
            period_days: 30,
            max_active_listings: 50,
        }
    }

    #[test]
    fn test_start_computes_period() {
        let sub = Subscription::start(UserId::new_random(), &plan()).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.ends_at - sub.starts_at, Duration::days(30));
        assert!(!sub.is_period_over(Utc::now()));
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut p = plan();
        p.period_days = 0;
        assert!(Subscription::start(UserId::new_random(), &p).is_err());
    }

    #[test]
    fn test_lazy_expiry_check() {
        let sub = Subscription::start(UserId::new_random(), &plan()).unwrap();
        assert!(sub.is_period_over(sub.ends_at + Duration::seconds(1)));
        assert!(!sub.is_period_over(sub.ends_at - Duration::seconds(1)));
    }

    #[test]
    fn test_addons() {
        let mut sub = Subscription::start(UserId::new_random(), &plan()).unwrap();
        sub.addons.push("featured-badge".to_string());
        assert!(sub.has_addon("featured-badge"));
        assert!(!sub.has_addon("extra-photos"));
    }
}
