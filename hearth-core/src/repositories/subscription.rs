use async_trait::async_trait;

use crate::{
    Error,
    subscription::{Addon, Subscription, SubscriptionId, SubscriptionPlan, SubscriptionStatus},
    user::UserId,
};

/// Repository for subscription plans, add-ons and user subscriptions.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync + 'static {
    /// Persist a plan, replacing any existing plan with the same key
    async fn upsert_plan(&self, plan: &SubscriptionPlan) -> Result<(), Error>;

    /// Find a plan by key
    async fn find_plan(&self, key: &str) -> Result<Option<SubscriptionPlan>, Error>;

    /// List all plans
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, Error>;

    /// Persist an add-on, replacing any existing add-on with the same key
    async fn upsert_addon(&self, addon: &Addon) -> Result<(), Error>;

    /// Find an add-on by key
    async fn find_addon(&self, key: &str) -> Result<Option<Addon>, Error>;

    /// List all add-ons
    async fn list_addons(&self) -> Result<Vec<Addon>, Error>;

    /// Persist a new subscription
    async fn create(&self, subscription: &Subscription) -> Result<Subscription, Error>;

    /// Find a subscription by ID
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, Error>;

    /// Find a user's most recent subscription
    async fn find_current_for_user(&self, user_id: &UserId)
    -> Result<Option<Subscription>, Error>;

    /// Update a subscription's status
    async fn update_status(
        &self,
        id: &SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<(), Error>;

    /// Replace the set of add-on keys attached to a subscription
    async fn set_addons(&self, id: &SubscriptionId, addons: &[String]) -> Result<(), Error>;
}
