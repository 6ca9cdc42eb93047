//! Notification campaign service.
//!
//! The repository stores whatever statistics snapshot it is handed, so
//! this service owns the invariant: after any mutation that touches the
//! recipient set, it recomputes the statistics from the freshly loaded
//! recipients and persists the result in the same call.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Error,
    error::StorageError,
    notification::{
        Notification, NotificationId, NotificationRecipient, NotificationStatus,
    },
    repositories::{NotificationRepository, Page, PageRequest},
    user::UserId,
};

/// Service for notification campaigns and delivery statistics.
pub struct NotificationService<R: NotificationRepository> {
    repository: Arc<R>,
}

impl<R: NotificationRepository> NotificationService<R> {
    /// Create a new NotificationService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a draft campaign
    pub async fn create_draft(&self, subject: &str, body: &str) -> Result<Notification, Error> {
        let notification = Notification::draft(subject.to_string(), body.to_string())?;
        self.repository.create(&notification).await
    }

    /// Get a campaign with its recipients and statistics
    pub async fn get(&self, id: &NotificationId) -> Result<Option<Notification>, Error> {
        self.repository.find_by_id(id).await
    }

    /// List campaigns, newest first
    pub async fn list(&self, page: PageRequest) -> Result<Page<Notification>, Error> {
        self.repository.list(page).await
    }

    /// Delete a campaign and its recipients
    pub async fn delete(&self, id: &NotificationId) -> Result<(), Error> {
        self.repository.delete(id).await
    }

    /// Add recipients to a campaign and refresh its statistics
    pub async fn add_recipients(
        &self,
        id: &NotificationId,
        recipients: Vec<(UserId, String)>,
    ) -> Result<Notification, Error> {
        let recipients: Vec<NotificationRecipient> = recipients
            .into_iter()
            .map(|(user_id, email)| NotificationRecipient::new(user_id, email))
            .collect();

        self.repository.add_recipients(id, &recipients).await?;
        self.refresh_statistics(id).await
    }

    /// Stamp a recipient as delivered and refresh statistics
    pub async fn mark_delivered(
        &self,
        id: &NotificationId,
        user_id: &UserId,
    ) -> Result<Notification, Error> {
        self.repository
            .mark_delivered(id, user_id, Utc::now())
            .await?;
        self.refresh_statistics(id).await
    }

    /// Stamp a recipient as opened and refresh statistics
    pub async fn mark_opened(
        &self,
        id: &NotificationId,
        user_id: &UserId,
    ) -> Result<Notification, Error> {
        self.repository.mark_opened(id, user_id, Utc::now()).await?;
        self.refresh_statistics(id).await
    }

    /// Stamp a recipient as clicked and refresh statistics
    pub async fn mark_clicked(
        &self,
        id: &NotificationId,
        user_id: &UserId,
    ) -> Result<Notification, Error> {
        self.repository.mark_clicked(id, user_id, Utc::now()).await?;
        self.refresh_statistics(id).await
    }

    /// Schedule a draft for dispatch at `at`
    pub async fn schedule(
        &self,
        id: &NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Notification, Error> {
        let mut notification = self.require(id).await?;
        notification.transition_to(NotificationStatus::Scheduled)?;
        notification.scheduled_at = Some(at);
        self.repository.update(&notification).await
    }

    /// Apply a status transition, validating it against the lifecycle
    pub async fn transition(
        &self,
        id: &NotificationId,
        next: NotificationStatus,
    ) -> Result<Notification, Error> {
        let mut notification = self.require(id).await?;
        notification.transition_to(next)?;
        self.repository
            .update_status(id, notification.status, notification.sent_at)
            .await?;
        Ok(notification)
    }

    /// Recompute the statistics snapshot from the stored recipients and
    /// persist it.
    pub async fn refresh_statistics(&self, id: &NotificationId) -> Result<Notification, Error> {
        let mut notification = self.require(id).await?;
        notification.recompute_statistics();
        self.repository.update_statistics(&notification).await?;
        Ok(notification)
    }

    async fn require(&self, id: &NotificationId) -> Result<Notification, Error> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))
    }
}
