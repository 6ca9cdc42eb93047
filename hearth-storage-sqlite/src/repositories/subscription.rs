use async_trait::async_trait;
use chrono::Utc;
use hearth_core::{
    Error, UserId,
    error::StorageError,
    repositories::SubscriptionRepository,
    subscription::{
        Addon, Subscription, SubscriptionId, SubscriptionPlan, SubscriptionStatus,
    },
};
use sqlx::SqlitePool;

use crate::{datetime_from_timestamp, storage_error};

pub struct SqliteSubscriptionRepository {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteSubscription {
    id: String,
    user_id: String,
    plan_key: String,
    status: String,
    starts_at: i64,
    ends_at: i64,
    addons: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteSubscription> for Subscription {
    type Error = Error;

    fn try_from(row: SqliteSubscription) -> Result<Self, Error> {
        let addons: Vec<String> = serde_json::from_str(&row.addons).map_err(|e| {
            tracing::error!(error = %e, "Corrupt subscription addons column");
            Error::Storage(StorageError::Database(
                "Corrupt subscription addons".to_string(),
            ))
        })?;

        Ok(Subscription {
            id: SubscriptionId::new(&row.id),
            user_id: UserId::new(&row.user_id),
            plan_key: row.plan_key,
            status: SubscriptionStatus::parse(&row.status)?,
            starts_at: datetime_from_timestamp(row.starts_at)?,
            ends_at: datetime_from_timestamp(row.ends_at)?,
            addons,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, plan_key, status, starts_at, ends_at, addons, created_at, updated_at";

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepository {
    async fn upsert_plan(&self, plan: &SubscriptionPlan) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO subscription_plans (key, name, price_cents, period_days, max_active_listings)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(key) DO UPDATE SET
                name = excluded.name,
                price_cents = excluded.price_cents,
                period_days = excluded.period_days,
                max_active_listings = excluded.max_active_listings
            "#,
        )
        .bind(&plan.key)
        .bind(&plan.name)
        .bind(plan.price_cents)
        .bind(plan.period_days)
        .bind(plan.max_active_listings)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to upsert plan"))?;

        Ok(())
    }

    async fn find_plan(&self, key: &str) -> Result<Option<SubscriptionPlan>, Error> {
        let plan = sqlx::query_as::<_, (String, String, i64, u32, u32)>(
            "SELECT key, name, price_cents, period_days, max_active_listings FROM subscription_plans WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get plan"))?;

        Ok(plan.map(
            |(key, name, price_cents, period_days, max_active_listings)| SubscriptionPlan {
                key,
                name,
                price_cents,
                period_days,
                max_active_listings,
            },
        ))
    }

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, Error> {
        let rows = sqlx::query_as::<_, (String, String, i64, u32, u32)>(
            "SELECT key, name, price_cents, period_days, max_active_listings FROM subscription_plans ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list plans"))?;

        Ok(rows
            .into_iter()
            .map(
                |(key, name, price_cents, period_days, max_active_listings)| SubscriptionPlan {
                    key,
                    name,
                    price_cents,
                    period_days,
                    max_active_listings,
                },
            )
            .collect())
    }

    async fn upsert_addon(&self, addon: &Addon) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO addons (key, name, price_cents)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET name = excluded.name, price_cents = excluded.price_cents
            "#,
        )
        .bind(&addon.key)
        .bind(&addon.name)
        .bind(addon.price_cents)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to upsert addon"))?;

        Ok(())
    }

    async fn find_addon(&self, key: &str) -> Result<Option<Addon>, Error> {
        let addon = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT key, name, price_cents FROM addons WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get addon"))?;

        Ok(addon.map(|(key, name, price_cents)| Addon {
            key,
            name,
            price_cents,
        }))
    }

    async fn list_addons(&self) -> Result<Vec<Addon>, Error> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT key, name, price_cents FROM addons ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list addons"))?;

        Ok(rows
            .into_iter()
            .map(|(key, name, price_cents)| Addon {
                key,
                name,
                price_cents,
            })
            .collect())
    }

    async fn create(&self, subscription: &Subscription) -> Result<Subscription, Error> {
        let addons = serde_json::to_string(&subscription.addons).map_err(|e| {
            Error::Storage(StorageError::Database(format!(
                "Failed to serialize addons: {e}"
            )))
        })?;

        let row = sqlx::query_as::<_, SqliteSubscription>(&format!(
            r#"
            INSERT INTO subscriptions
                (id, user_id, plan_key, status, starts_at, ends_at, addons, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(subscription.id.as_str())
        .bind(subscription.user_id.as_str())
        .bind(&subscription.plan_key)
        .bind(subscription.status.as_str())
        .bind(subscription.starts_at.timestamp())
        .bind(subscription.ends_at.timestamp())
        .bind(addons)
        .bind(subscription.created_at.timestamp())
        .bind(subscription.updated_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to create subscription"))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, Error> {
        let row = sqlx::query_as::<_, SqliteSubscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get subscription"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_current_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, Error> {
        let row = sqlx::query_as::<_, SqliteSubscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get current subscription"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_status(
        &self,
        id: &SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query("UPDATE subscriptions SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update subscription status"))?;

        Ok(())
    }

    async fn set_addons(&self, id: &SubscriptionId, addons: &[String]) -> Result<(), Error> {
        let now = Utc::now().timestamp();
        let addons = serde_json::to_string(addons).map_err(|e| {
            Error::Storage(StorageError::Database(format!(
                "Failed to serialize addons: {e}"
            )))
        })?;

        sqlx::query("UPDATE subscriptions SET addons = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(addons)
            .bind(now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update subscription addons"))?;

        Ok(())
    }
}
