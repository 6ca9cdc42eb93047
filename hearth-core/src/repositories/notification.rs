use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error,
    notification::{Notification, NotificationId, NotificationRecipient, NotificationStatus},
    repositories::{Page, PageRequest},
    user::UserId,
};

/// Repository for notification campaigns and their recipients.
///
/// The `statistics` block stored with a notification is always the
/// snapshot most recently computed by the caller; this repository never
/// derives it on its own.
#[async_trait]
pub trait NotificationRepository: Send + Sync + 'static {
    /// Persist a new notification with its recipients and statistics
    async fn create(&self, notification: &Notification) -> Result<Notification, Error>;

    /// Find a notification, including its recipients, by ID
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, Error>;

    /// Update a notification's fields, recipients and statistics snapshot
    async fn update(&self, notification: &Notification) -> Result<Notification, Error>;

    /// Delete a notification and its recipients
    async fn delete(&self, id: &NotificationId) -> Result<(), Error>;

    /// Add recipients to a notification
    async fn add_recipients(
        &self,
        id: &NotificationId,
        recipients: &[NotificationRecipient],
    ) -> Result<(), Error>;

    /// Stamp a recipient's delivered timestamp
    async fn mark_delivered(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Stamp a recipient's opened timestamp
    async fn mark_opened(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Stamp a recipient's clicked timestamp
    async fn mark_clicked(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Replace the stored statistics snapshot for a notification
    async fn update_statistics(&self, notification: &Notification) -> Result<(), Error>;

    /// Update only the status (and `sent_at` when present)
    async fn update_status(
        &self,
        id: &NotificationId,
        status: NotificationStatus,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error>;

    /// List notifications, newest first
    async fn list(&self, page: PageRequest) -> Result<Page<Notification>, Error>;
}
