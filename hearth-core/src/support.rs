//! Support tickets and reply threads
//!
//! Tickets carry a status that replies move back and forth: a staff reply
//! hands the ticket to the requester (`Open -> Pending`), a requester
//! reply hands it back (`Pending -> Open`). Resolution is explicit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    user::UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(id: &str) -> Self {
        TicketId(id.to_string())
    }

    pub fn new_random() -> Self {
        TicketId(generate_prefixed_id("tkt"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "tkt")
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for TicketId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Waiting on staff.
    Open,
    /// Waiting on the requester.
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "pending" => Ok(TicketStatus::Pending),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown ticket status: {other}"
            ))),
        }
    }

    /// Whether replies are still accepted in this state.
    pub fn accepts_replies(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::Pending)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Normal => "normal",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "low" => Ok(TicketPriority::Low),
            "normal" => Ok(TicketPriority::Normal),
            "high" => Ok(TicketPriority::High),
            "urgent" => Ok(TicketPriority::Urgent),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown ticket priority: {other}"
            ))),
        }
    }
}

/// A support ticket opened by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: TicketId,
    pub user_id: UserId,
    pub subject: String,
    pub body: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupportTicket {
    /// Open a new ticket.
    pub fn open(
        user_id: UserId,
        subject: String,
        body: String,
        priority: TicketPriority,
    ) -> Result<Self, Error> {
        if subject.trim().is_empty() {
            return Err(ValidationError::MissingField("Subject is required".to_string()).into());
        }
        if body.trim().is_empty() {
            return Err(ValidationError::MissingField("Body is required".to_string()).into());
        }
        let now = Utc::now();
        Ok(Self {
            id: TicketId::new_random(),
            user_id,
            subject,
            body,
            status: TicketStatus::Open,
            priority,
            created_at: now,
            updated_at: now,
        })
    }

    /// The status the ticket should move to after a reply.
    ///
    /// Staff replies hand the ticket to the requester; requester replies
    /// hand it back to staff. Replies never reopen resolved tickets.
    pub fn status_after_reply(&self, staff: bool) -> TicketStatus {
        match (self.status, staff) {
            (TicketStatus::Open, true) => TicketStatus::Pending,
            (TicketStatus::Pending, false) => TicketStatus::Open,
            (status, _) => status,
        }
    }
}

/// One message in a ticket's reply thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReply {
    pub id: i64,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    /// True when the author replied on behalf of the marketplace.
    pub staff: bool,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> SupportTicket {
        SupportTicket::open(
            UserId::new_random(),
            "Cannot publish listing".to_string(),
            "The publish button reports an error".to_string(),
            TicketPriority::Normal,
        )
        .unwrap()
    }

    #[test]
    fn test_open_ticket() {
        let t = ticket();
        assert_eq!(t.status, TicketStatus::Open);
        assert!(t.id.is_valid());
    }

    #[test]
    fn test_open_requires_subject_and_body() {
        assert!(
            SupportTicket::open(
                UserId::new_random(),
                " ".to_string(),
                "body".to_string(),
                TicketPriority::Low
            )
            .is_err()
        );
        assert!(
            SupportTicket::open(
                UserId::new_random(),
                "subject".to_string(),
                "".to_string(),
                TicketPriority::Low
            )
            .is_err()
        );
    }

    #[test]
    fn test_reply_toggles_status() {
        let mut t = ticket();
        assert_eq!(t.status_after_reply(true), TicketStatus::Pending);

        t.status = TicketStatus::Pending;
        assert_eq!(t.status_after_reply(false), TicketStatus::Open);

        // A requester follow-up on an already-open ticket changes nothing
        t.status = TicketStatus::Open;
        assert_eq!(t.status_after_reply(false), TicketStatus::Open);
    }

    #[test]
    fn test_resolved_tickets_reject_replies() {
        assert!(!TicketStatus::Resolved.accepts_replies());
        assert!(!TicketStatus::Closed.accepts_replies());
        assert!(TicketStatus::Open.accepts_replies());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(TicketPriority::Urgent > TicketPriority::High);
        assert!(TicketPriority::Normal > TicketPriority::Low);
    }
}
