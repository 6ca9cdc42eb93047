//! SQLite implementation of the notification repository.
//!
//! Campaigns and recipients live in separate tables; the statistics
//! snapshot is stored as JSON alongside the campaign row and always
//! written verbatim from the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{
    Error, UserId,
    error::StorageError,
    notification::{
        Notification, NotificationId, NotificationRecipient, NotificationStatistics,
        NotificationStatus,
    },
    repositories::{NotificationRepository, Page, PageRequest},
};
use sqlx::SqlitePool;

use crate::{datetime_from_timestamp, optional_datetime_from_timestamp, storage_error};

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_recipients(
        &self,
        id: &NotificationId,
    ) -> Result<Vec<NotificationRecipient>, Error> {
        let rows = sqlx::query_as::<_, SqliteRecipient>(
            r#"
            SELECT user_id, email, delivered_at, opened_at, clicked_at
            FROM notification_recipients
            WHERE notification_id = ?1
            ORDER BY id
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to load notification recipients"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn hydrate(&self, row: SqliteNotification) -> Result<Notification, Error> {
        let id = NotificationId::new(&row.id);
        let recipients = self.load_recipients(&id).await?;

        let statistics: NotificationStatistics = serde_json::from_str(&row.statistics)
            .map_err(|e| {
                tracing::error!(error = %e, "Corrupt notification statistics column");
                Error::Storage(StorageError::Database(
                    "Corrupt notification statistics".to_string(),
                ))
            })?;

        Ok(Notification {
            id,
            subject: row.subject,
            body: row.body,
            status: NotificationStatus::parse(&row.status)?,
            recipients,
            statistics,
            scheduled_at: optional_datetime_from_timestamp(row.scheduled_at)?,
            sent_at: optional_datetime_from_timestamp(row.sent_at)?,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteNotification {
    id: String,
    subject: String,
    body: String,
    status: String,
    statistics: String,
    scheduled_at: Option<i64>,
    sent_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteRecipient {
    user_id: String,
    email: String,
    delivered_at: Option<i64>,
    opened_at: Option<i64>,
    clicked_at: Option<i64>,
}

impl TryFrom<SqliteRecipient> for NotificationRecipient {
    type Error = Error;

    fn try_from(row: SqliteRecipient) -> Result<Self, Error> {
        Ok(NotificationRecipient {
            user_id: UserId::new(&row.user_id),
            email: row.email,
            delivered_at: optional_datetime_from_timestamp(row.delivered_at)?,
            opened_at: optional_datetime_from_timestamp(row.opened_at)?,
            clicked_at: optional_datetime_from_timestamp(row.clicked_at)?,
        })
    }
}

fn statistics_json(statistics: &NotificationStatistics) -> Result<String, Error> {
    serde_json::to_string(statistics).map_err(|e| {
        Error::Storage(StorageError::Database(format!(
            "Failed to serialize statistics: {e}"
        )))
    })
}

const NOTIFICATION_COLUMNS: &str =
    "id, subject, body, status, statistics, scheduled_at, sent_at, created_at, updated_at";

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification, Error> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, subject, body, status, statistics, scheduled_at, sent_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(notification.id.as_str())
        .bind(&notification.subject)
        .bind(&notification.body)
        .bind(notification.status.as_str())
        .bind(statistics_json(&notification.statistics)?)
        .bind(notification.scheduled_at.map(|dt| dt.timestamp()))
        .bind(notification.sent_at.map(|dt| dt.timestamp()))
        .bind(notification.created_at.timestamp())
        .bind(notification.updated_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to create notification"))?;

        if !notification.recipients.is_empty() {
            self.add_recipients(&notification.id, &notification.recipients)
                .await?;
        }

        self.find_by_id(&notification.id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, Error> {
        let row = sqlx::query_as::<_, SqliteNotification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get notification"))?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn update(&self, notification: &Notification) -> Result<Notification, Error> {
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE notifications
            SET subject = ?2, body = ?3, status = ?4, statistics = ?5,
                scheduled_at = ?6, sent_at = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(notification.id.as_str())
        .bind(&notification.subject)
        .bind(&notification.body)
        .bind(notification.status.as_str())
        .bind(statistics_json(&notification.statistics)?)
        .bind(notification.scheduled_at.map(|dt| dt.timestamp()))
        .bind(notification.sent_at.map(|dt| dt.timestamp()))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to update notification"))?;

        self.find_by_id(&notification.id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), Error> {
        sqlx::query("DELETE FROM notification_recipients WHERE notification_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete notification recipients"))?;

        sqlx::query("DELETE FROM notifications WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete notification"))?;

        Ok(())
    }

    async fn add_recipients(
        &self,
        id: &NotificationId,
        recipients: &[NotificationRecipient],
    ) -> Result<(), Error> {
        for recipient in recipients {
            sqlx::query(
                r#"
                INSERT INTO notification_recipients
                    (notification_id, user_id, email, delivered_at, opened_at, clicked_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(notification_id, user_id) DO NOTHING
                "#,
            )
            .bind(id.as_str())
            .bind(recipient.user_id.as_str())
            .bind(&recipient.email)
            .bind(recipient.delivered_at.map(|dt| dt.timestamp()))
            .bind(recipient.opened_at.map(|dt| dt.timestamp()))
            .bind(recipient.clicked_at.map(|dt| dt.timestamp()))
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to add notification recipient"))?;
        }
        Ok(())
    }

    async fn mark_delivered(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query(
            "UPDATE notification_recipients SET delivered_at = ?1 WHERE notification_id = ?2 AND user_id = ?3",
        )
        .bind(at.timestamp())
        .bind(id.as_str())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to mark recipient delivered"))?;

        Ok(())
    }

    async fn mark_opened(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query(
            "UPDATE notification_recipients SET opened_at = ?1 WHERE notification_id = ?2 AND user_id = ?3",
        )
        .bind(at.timestamp())
        .bind(id.as_str())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to mark recipient opened"))?;

        Ok(())
    }

    async fn mark_clicked(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query(
            "UPDATE notification_recipients SET clicked_at = ?1 WHERE notification_id = ?2 AND user_id = ?3",
        )
        .bind(at.timestamp())
        .bind(id.as_str())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to mark recipient clicked"))?;

        Ok(())
    }

    async fn update_statistics(&self, notification: &Notification) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query("UPDATE notifications SET statistics = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(statistics_json(&notification.statistics)?)
            .bind(now)
            .bind(notification.id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update notification statistics"))?;

        Ok(())
    }

    async fn update_status(
        &self,
        id: &NotificationId,
        status: NotificationStatus,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query(
            "UPDATE notifications SET status = ?1, sent_at = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(status.as_str())
        .bind(sent_at.map(|dt| dt.timestamp()))
        .bind(now)
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to update notification status"))?;

        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Notification>, Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to count notifications"))?;

        let rows = sqlx::query_as::<_, SqliteNotification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list notifications"))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(self.hydrate(row).await?);
        }

        Ok(Page::new(items, total as u64, page))
    }
}
