//! Listing promotion requests
//!
//! Vendors request a promotion window for a listing; admins approve or
//! reject. The date range is validated when the request is constructed,
//! so an inverted or already-ended window never reaches storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    property::PropertyId,
    user::UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct PromotionId(String);

impl PromotionId {
    pub fn new(id: &str) -> Self {
        PromotionId(id.to_string())
    }

    pub fn new_random() -> Self {
        PromotionId(generate_prefixed_id("promo"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "promo")
    }
}

impl Default for PromotionId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for PromotionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PromotionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    Pending,
    Approved,
    Rejected,
}

impl PromotionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionStatus::Pending => "pending",
            PromotionStatus::Approved => "approved",
            PromotionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(PromotionStatus::Pending),
            "approved" => Ok(PromotionStatus::Approved),
            "rejected" => Ok(PromotionStatus::Rejected),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown promotion status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to promote a listing for a date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRequest {
    pub id: PromotionId,
    pub property_id: PropertyId,
    pub requested_by: UserId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: PromotionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromotionRequest {
    /// Create a pending request, validating the window.
    ///
    /// `starts_at` must precede `ends_at`, and the window must not have
    /// already ended.
    pub fn new(
        property_id: PropertyId,
        requested_by: UserId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Self, Error> {
        if starts_at >= ends_at {
            return Err(ValidationError::InvalidDateRange(
                "Promotion start must precede its end".to_string(),
            )
            .into());
        }
        let now = Utc::now();
        if ends_at <= now {
            return Err(ValidationError::InvalidDateRange(
                "Promotion window has already ended".to_string(),
            )
            .into());
        }
        Ok(Self {
            id: PromotionId::new_random(),
            property_id,
            requested_by,
            starts_at,
            ends_at,
            status: PromotionStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the promotion window covers `now`.
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.status == PromotionStatus::Approved && self.starts_at <= now && now < self.ends_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_valid_window() {
        let now = Utc::now();
        let request = PromotionRequest::new(
            PropertyId::new_random(),
            UserId::new_random(),
            now + Duration::days(1),
            now + Duration::days(8),
        )
        .unwrap();
        assert_eq!(request.status, PromotionStatus::Pending);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let now = Utc::now();
        let result = PromotionRequest::new(
            PropertyId::new_random(),
            UserId::new_random(),
            now + Duration::days(8),
            now + Duration::days(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_past_window_rejected() {
        let now = Utc::now();
        let result = PromotionRequest::new(
            PropertyId::new_random(),
            UserId::new_random(),
            now - Duration::days(8),
            now - Duration::days(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_is_running() {
        let now = Utc::now();
        // A window that started in the past is valid as long as it has
        // not ended yet.
        let mut request = PromotionRequest::new(
            PropertyId::new_random(),
            UserId::new_random(),
            now - Duration::days(1),
            now + Duration::days(1),
        )
        .unwrap();
        assert!(!request.is_running(now));
        request.status = PromotionStatus::Approved;
        assert!(request.is_running(now));
        assert!(!request.is_running(now + Duration::days(2)));
    }
}
