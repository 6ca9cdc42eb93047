//! Vendor service offerings, bookings and reviews
//!
//! A vendor service (photography, moving, inspection, …) carries a
//! denormalized `ServiceStatistics` block derived from its bookings and
//! reviews. The recompute is pure; the booking service re-runs it after
//! every booking or review mutation and persists the result explicitly,
//! so there is no hidden cross-document coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    user::UserId,
    validation::validate_rating,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct VendorServiceId(String);

impl VendorServiceId {
    pub fn new(id: &str) -> Self {
        VendorServiceId(id.to_string())
    }

    pub fn new_random() -> Self {
        VendorServiceId(generate_prefixed_id("svc"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "svc")
    }
}

impl Default for VendorServiceId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for VendorServiceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for VendorServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct BookingId(String);

impl BookingId {
    pub fn new(id: &str) -> Self {
        BookingId(id.to_string())
    }

    pub fn new_random() -> Self {
        BookingId(generate_prefixed_id("bkg"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for BookingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown booking status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Denormalized aggregate over a service's bookings and reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceStatistics {
    pub total_bookings: u32,
    pub completed_bookings: u32,
    pub total_reviews: u32,
    /// Mean rating across reviews, 0.0 when there are none.
    pub average_rating: f64,
}

impl ServiceStatistics {
    /// Recompute the aggregate from its source rows.
    pub fn recompute(bookings: &[ServiceBooking], reviews: &[Review]) -> Self {
        let total_bookings = bookings.len() as u32;
        let completed_bookings = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .count() as u32;
        let total_reviews = reviews.len() as u32;
        let average_rating = if reviews.is_empty() {
            0.0
        } else {
            reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / reviews.len() as f64
        };

        Self {
            total_bookings,
            completed_bookings,
            total_reviews,
            average_rating,
        }
    }
}

/// A service offered by a vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorService {
    pub id: VendorServiceId,
    pub vendor_id: UserId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price_cents: i64,
    pub statistics: ServiceStatistics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VendorService {
    pub fn new(
        vendor_id: UserId,
        name: String,
        description: String,
        category: String,
        price_cents: i64,
    ) -> Result<Self, Error> {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("Name is required".to_string()).into());
        }
        if price_cents < 0 {
            return Err(
                ValidationError::InvalidField("Price must not be negative".to_string()).into(),
            );
        }
        let now = Utc::now();
        Ok(Self {
            id: VendorServiceId::new_random(),
            vendor_id,
            name,
            description,
            category,
            price_cents,
            statistics: ServiceStatistics::default(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// A booking of a vendor service by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBooking {
    pub id: BookingId,
    pub service_id: VendorServiceId,
    pub user_id: UserId,
    pub scheduled_for: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceBooking {
    pub fn new(
        service_id: VendorServiceId,
        user_id: UserId,
        scheduled_for: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BookingId::new_random(),
            service_id,
            user_id,
            scheduled_for,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A review left for a vendor service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub service_id: VendorServiceId,
    pub user_id: UserId,
    /// 1 through 5.
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The data required to create a new review; rating validated up front.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub service_id: VendorServiceId,
    pub user_id: UserId,
    pub rating: u8,
    pub comment: Option<String>,
}

impl NewReview {
    pub fn new(
        service_id: VendorServiceId,
        user_id: UserId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Self, Error> {
        validate_rating(rating)?;
        Ok(Self {
            service_id,
            user_id,
            rating,
            comment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(status: BookingStatus) -> ServiceBooking {
        let mut b = ServiceBooking::new(
            VendorServiceId::new_random(),
            UserId::new_random(),
            Utc::now(),
        );
        b.status = status;
        b
    }

    fn review(rating: u8) -> Review {
        Review {
            id: 1,
            service_id: VendorServiceId::new_random(),
            user_id: UserId::new_random(),
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_statistics_empty_sources() {
        let stats = ServiceStatistics::recompute(&[], &[]);
        assert_eq!(stats, ServiceStatistics::default());
        assert!(!stats.average_rating.is_nan());
    }

    #[test]
    fn test_statistics_counts_and_average() {
        let bookings = vec![
            booking(BookingStatus::Completed),
            booking(BookingStatus::Completed),
            booking(BookingStatus::Cancelled),
        ];
        let reviews = vec![review(5), review(4)];

        let stats = ServiceStatistics::recompute(&bookings, &reviews);
        assert_eq!(stats.total_bookings, 3);
        assert_eq!(stats.completed_bookings, 2);
        assert_eq!(stats.total_reviews, 2);
        assert_eq!(stats.average_rating, 4.5);
    }

    #[test]
    fn test_new_review_validates_rating() {
        assert!(
            NewReview::new(VendorServiceId::new_random(), UserId::new_random(), 0, None).is_err()
        );
        assert!(
            NewReview::new(VendorServiceId::new_random(), UserId::new_random(), 5, None).is_ok()
        );
    }

    #[test]
    fn test_service_rejects_negative_price() {
        let result = VendorService::new(
            UserId::new_random(),
            "Drone photos".to_string(),
            String::new(),
            "photography".to_string(),
            -100,
        );
        assert!(result.is_err());
    }
}
