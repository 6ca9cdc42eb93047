//! Subscription service.
//!
//! Expiry is lazy: reading a subscription whose period has lapsed flips
//! it to `Expired` through an explicit status write before it is
//! returned, so callers and storage always agree.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error,
    error::{StorageError, ValidationError},
    repositories::SubscriptionRepository,
    subscription::{Addon, Subscription, SubscriptionPlan, SubscriptionStatus},
    user::UserId,
};

/// Service for plans, add-ons and user subscriptions.
pub struct SubscriptionService<R: SubscriptionRepository> {
    repository: Arc<R>,
}

impl<R: SubscriptionRepository> SubscriptionService<R> {
    /// Create a new SubscriptionService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create or replace a plan
    pub async fn upsert_plan(&self, plan: &SubscriptionPlan) -> Result<(), Error> {
        if plan.key.trim().is_empty() {
            return Err(ValidationError::MissingField("Plan key is required".to_string()).into());
        }
        if plan.period_days == 0 {
            return Err(ValidationError::InvalidField(
                "Plan period must be at least one day".to_string(),
            )
            .into());
        }
        self.repository.upsert_plan(plan).await
    }

    /// List all plans
    pub async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, Error> {
        self.repository.list_plans().await
    }

    /// Create or replace an add-on
    pub async fn upsert_addon(&self, addon: &Addon) -> Result<(), Error> {
        if addon.key.trim().is_empty() {
            return Err(ValidationError::MissingField("Addon key is required".to_string()).into());
        }
        self.repository.upsert_addon(addon).await
    }

    /// List all add-ons
    pub async fn list_addons(&self) -> Result<Vec<Addon>, Error> {
        self.repository.list_addons().await
    }

    /// Subscribe a user to a plan for one billing period from now
    pub async fn subscribe(&self, user_id: &UserId, plan_key: &str) -> Result<Subscription, Error> {
        let plan = self
            .repository
            .find_plan(plan_key)
            .await?
            .ok_or_else(|| ValidationError::InvalidField(format!("Unknown plan: {plan_key}")))?;

        let subscription = Subscription::start(user_id.clone(), &plan)?;
        self.repository.create(&subscription).await
    }

    /// A user's current subscription, lazily expiring a lapsed period.
    pub async fn current_for_user(&self, user_id: &UserId) -> Result<Option<Subscription>, Error> {
        let Some(mut subscription) = self.repository.find_current_for_user(user_id).await? else {
            return Ok(None);
        };

        if subscription.status == SubscriptionStatus::Active
            && subscription.is_period_over(Utc::now())
        {
            self.repository
                .update_status(&subscription.id, SubscriptionStatus::Expired)
                .await?;
            subscription.status = SubscriptionStatus::Expired;
        }

        Ok(Some(subscription))
    }

    /// Cancel a user's current subscription
    pub async fn cancel(&self, user_id: &UserId) -> Result<Subscription, Error> {
        let mut subscription = self
            .current_for_user(user_id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;

        if subscription.status != SubscriptionStatus::Active {
            return Err(ValidationError::InvalidTransition(format!(
                "Cannot cancel a {} subscription",
                subscription.status
            ))
            .into());
        }

        self.repository
            .update_status(&subscription.id, SubscriptionStatus::Cancelled)
            .await?;
        subscription.status = SubscriptionStatus::Cancelled;
        Ok(subscription)
    }

    /// Attach an add-on to a user's active subscription
    pub async fn attach_addon(&self, user_id: &UserId, addon_key: &str) -> Result<Subscription, Error> {
        let addon = self
            .repository
            .find_addon(addon_key)
            .await?
            .ok_or_else(|| ValidationError::InvalidField(format!("Unknown addon: {addon_key}")))?;

        let mut subscription = self
            .current_for_user(user_id)
            .await?
            .filter(|s| s.status == SubscriptionStatus::Active)
            .ok_or(Error::Storage(StorageError::NotFound))?;

        if !subscription.has_addon(&addon.key) {
            subscription.addons.push(addon.key.clone());
            self.repository
                .set_addons(&subscription.id, &subscription.addons)
                .await?;
        }

        Ok(subscription)
    }

    /// Detach an add-on from a user's active subscription
    pub async fn detach_addon(&self, user_id: &UserId, addon_key: &str) -> Result<Subscription, Error> {
        let mut subscription = self
            .current_for_user(user_id)
            .await?
            .filter(|s| s.status == SubscriptionStatus::Active)
            .ok_or(Error::Storage(StorageError::NotFound))?;

        if subscription.has_addon(addon_key) {
            subscription.addons.retain(|a| a != addon_key);
            self.repository
                .set_addons(&subscription.id, &subscription.addons)
                .await?;
        }

        Ok(subscription)
    }
}
