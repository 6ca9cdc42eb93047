//! Notification campaigns and delivery statistics
//!
//! A notification is a campaign record: a subject and body, the set of
//! recipients it fans out to, and a denormalized statistics block that is
//! always recomputed from the recipients before persisting. Dispatch
//! itself happens outside Hearth; the status transitions below are the
//! contract the external dispatcher drives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    user::UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(id: &str) -> Self {
        NotificationId(id.to_string())
    }

    pub fn new_random() -> Self {
        NotificationId(generate_prefixed_id("ntf"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "ntf")
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for NotificationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Campaign lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
    Cancelled,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Draft => "draft",
            NotificationStatus::Scheduled => "scheduled",
            NotificationStatus::Sending => "sending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
            NotificationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "draft" => Ok(NotificationStatus::Draft),
            "scheduled" => Ok(NotificationStatus::Scheduled),
            "sending" => Ok(NotificationStatus::Sending),
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            "cancelled" => Ok(NotificationStatus::Cancelled),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown notification status: {other}"
            ))),
        }
    }

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Draft → Scheduled | Sending | Cancelled, Scheduled → Sending |
    /// Cancelled, Sending → Sent | Failed. Sent, Failed and Cancelled
    /// are terminal.
    pub fn can_transition_to(&self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        matches!(
            (self, next),
            (Draft, Scheduled)
                | (Draft, Sending)
                | (Draft, Cancelled)
                | (Scheduled, Sending)
                | (Scheduled, Cancelled)
                | (Sending, Sent)
                | (Sending, Failed)
        )
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recipient of a campaign, with funnel timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecipient {
    pub user_id: UserId,
    pub email: String,
    pub delivered_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
}

impl NotificationRecipient {
    pub fn new(user_id: UserId, email: String) -> Self {
        Self {
            user_id,
            email: email.to_lowercase(),
            delivered_at: None,
            opened_at: None,
            clicked_at: None,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }

    pub fn is_opened(&self) -> bool {
        self.opened_at.is_some()
    }

    pub fn is_clicked(&self) -> bool {
        self.clicked_at.is_some()
    }
}

/// Denormalized funnel counts and rates, derived from the recipient set.
///
/// Always a recomputed snapshot; never mutated directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationStatistics {
    pub total_recipients: u32,
    pub delivered: u32,
    pub opened: u32,
    pub clicked: u32,
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
}

/// Percentage of `part` in `whole`, 0.0 when the denominator is zero.
fn rate(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

impl NotificationStatistics {
    /// Recompute the snapshot from the authoritative recipient list.
    ///
    /// Every ratio is guarded: a zero denominator yields 0.0, never NaN.
    pub fn recompute(recipients: &[NotificationRecipient]) -> Self {
        let total_recipients = recipients.len() as u32;
        let delivered = recipients.iter().filter(|r| r.is_delivered()).count() as u32;
        let opened = recipients.iter().filter(|r| r.is_opened()).count() as u32;
        let clicked = recipients.iter().filter(|r| r.is_clicked()).count() as u32;

        Self {
            total_recipients,
            delivered,
            opened,
            clicked,
            delivery_rate: rate(delivered, total_recipients),
            open_rate: rate(opened, delivered),
            click_rate: rate(clicked, opened),
        }
    }
}

/// A notification campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub subject: String,
    pub body: String,
    pub status: NotificationStatus,
    pub recipients: Vec<NotificationRecipient>,
    pub statistics: NotificationStatistics,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new draft with no recipients.
    pub fn draft(subject: String, body: String) -> Result<Self, Error> {
        if subject.trim().is_empty() {
            return Err(ValidationError::MissingField("Subject is required".to_string()).into());
        }
        let now = Utc::now();
        Ok(Self {
            id: NotificationId::new_random(),
            subject,
            body,
            status: NotificationStatus::Draft,
            recipients: Vec::new(),
            statistics: NotificationStatistics::default(),
            scheduled_at: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Recompute the statistics snapshot from the recipient list.
    /// Must be called before any persist that touched recipients.
    pub fn recompute_statistics(&mut self) {
        self.statistics = NotificationStatistics::recompute(&self.recipients);
    }

    /// Apply a status transition, validating it against the lifecycle.
    pub fn transition_to(&mut self, next: NotificationStatus) -> Result<(), Error> {
        if !self.status.can_transition_to(next) {
            return Err(ValidationError::InvalidTransition(format!(
                "{} -> {}",
                self.status, next
            ))
            .into());
        }
        if next == NotificationStatus::Sent {
            self.sent_at = Some(Utc::now());
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(
        delivered: bool,
        opened: bool,
        clicked: bool,
    ) -> NotificationRecipient {
        let now = Utc::now();
        NotificationRecipient {
            user_id: UserId::new_random(),
            email: "user@example.com".to_string(),
            delivered_at: delivered.then_some(now),
            opened_at: opened.then_some(now),
            clicked_at: clicked.then_some(now),
        }
    }

    #[test]
    fn test_statistics_empty_recipients() {
        let stats = NotificationStatistics::recompute(&[]);
        assert_eq!(stats.total_recipients, 0);
        assert_eq!(stats.delivery_rate, 0.0);
        assert_eq!(stats.open_rate, 0.0);
        assert_eq!(stats.click_rate, 0.0);
        assert!(!stats.delivery_rate.is_nan());
    }

    #[test]
    fn test_statistics_zero_delivered_guard() {
        // Recipients exist but nothing was delivered: every rate must stay
        // defined rather than dividing by zero.
        let stats = NotificationStatistics::recompute(&[
            recipient(false, false, false),
            recipient(false, false, false),
        ]);
        assert_eq!(stats.total_recipients, 2);
        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.delivery_rate, 0.0);
        assert_eq!(stats.open_rate, 0.0);
        assert!(!stats.open_rate.is_nan());
    }

    #[test]
    fn test_statistics_funnel_rates() {
        // 4 recipients, 3 delivered, 2 opened, 1 clicked
        let stats = NotificationStatistics::recompute(&[
            recipient(true, true, true),
            recipient(true, true, false),
            recipient(true, false, false),
            recipient(false, false, false),
        ]);
        assert_eq!(stats.delivery_rate, 75.0);
        assert_eq!(stats.open_rate, 2.0 / 3.0 * 100.0);
        assert_eq!(stats.click_rate, 50.0);
    }

    #[test]
    fn test_recompute_tracks_recipients() {
        let mut notification =
            Notification::draft("Open house".to_string(), "This weekend".to_string()).unwrap();
        notification.recipients.push(recipient(true, false, false));
        notification.recompute_statistics();
        assert_eq!(notification.statistics.total_recipients, 1);
        assert_eq!(notification.statistics.delivered, 1);
    }

    #[test]
    fn test_status_transitions() {
        let mut n =
            Notification::draft("Subject".to_string(), "Body".to_string()).unwrap();
        assert_eq!(n.status, NotificationStatus::Draft);

        n.transition_to(NotificationStatus::Scheduled).unwrap();
        n.transition_to(NotificationStatus::Sending).unwrap();
        n.transition_to(NotificationStatus::Sent).unwrap();
        assert!(n.sent_at.is_some());

        // Sent is terminal
        assert!(n.transition_to(NotificationStatus::Draft).is_err());
    }

    #[test]
    fn test_invalid_transition() {
        let mut n = Notification::draft("Subject".to_string(), "Body".to_string()).unwrap();
        assert!(n.transition_to(NotificationStatus::Sent).is_err());
        assert_eq!(n.status, NotificationStatus::Draft);
    }

    #[test]
    fn test_draft_requires_subject() {
        assert!(Notification::draft("  ".to_string(), "Body".to_string()).is_err());
    }
}
