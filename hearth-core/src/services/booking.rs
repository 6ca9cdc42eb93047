//! Vendor service bookings and reviews.
//!
//! The denormalized `ServiceStatistics` block on an offering is kept
//! consistent by an explicit refresh after every booking or review
//! mutation. The refresh is a visible application-layer step whose
//! failure propagates to the caller; the triggering mutation is already
//! committed at that point, so a failed refresh can be retried without
//! repeating the booking.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Error,
    error::StorageError,
    repositories::{Page, PageRequest, VendorRepository},
    user::UserId,
    vendor::{
        BookingId, BookingStatus, NewReview, Review, ServiceBooking, ServiceStatistics,
        VendorService, VendorServiceId,
    },
};

/// Service for vendor offerings, bookings and reviews.
pub struct BookingService<R: VendorRepository> {
    repository: Arc<R>,
}

impl<R: VendorRepository> BookingService<R> {
    /// Create a new BookingService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a vendor service offering
    pub async fn create_service(
        &self,
        vendor_id: &UserId,
        name: &str,
        description: &str,
        category: &str,
        price_cents: i64,
    ) -> Result<VendorService, Error> {
        let service = VendorService::new(
            vendor_id.clone(),
            name.to_string(),
            description.to_string(),
            category.to_string(),
            price_cents,
        )?;
        self.repository.create_service(&service).await
    }

    /// Get an offering by ID
    pub async fn get_service(&self, id: &VendorServiceId) -> Result<Option<VendorService>, Error> {
        self.repository.find_service(id).await
    }

    /// List offerings, newest first
    pub async fn list_services(&self, page: PageRequest) -> Result<Page<VendorService>, Error> {
        self.repository.list_services(page).await
    }

    /// Delete an offering with its bookings and reviews
    pub async fn delete_service(&self, id: &VendorServiceId) -> Result<(), Error> {
        self.repository.delete_service(id).await
    }

    /// Book a service, then refresh the offering's statistics.
    pub async fn book(
        &self,
        service_id: &VendorServiceId,
        user_id: &UserId,
        scheduled_for: DateTime<Utc>,
    ) -> Result<ServiceBooking, Error> {
        let _ = self
            .repository
            .find_service(service_id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;

        let booking = ServiceBooking::new(service_id.clone(), user_id.clone(), scheduled_for);
        let booking = self.repository.create_booking(&booking).await?;

        self.refresh_statistics(service_id).await?;

        Ok(booking)
    }

    /// Update a booking's status, then refresh the offering's statistics.
    pub async fn set_booking_status(
        &self,
        booking_id: &BookingId,
        status: BookingStatus,
    ) -> Result<ServiceBooking, Error> {
        let mut booking = self
            .repository
            .find_booking(booking_id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;

        self.repository
            .update_booking_status(booking_id, status)
            .await?;
        booking.status = status;

        self.refresh_statistics(&booking.service_id).await?;

        Ok(booking)
    }

    /// Add a review, then refresh the offering's statistics.
    pub async fn add_review(
        &self,
        service_id: &VendorServiceId,
        user_id: &UserId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Review, Error> {
        let _ = self
            .repository
            .find_service(service_id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;

        let review = NewReview::new(service_id.clone(), user_id.clone(), rating, comment)?;
        let review = self.repository.create_review(&review).await?;

        self.refresh_statistics(service_id).await?;

        Ok(review)
    }

    /// Recompute an offering's statistics from its bookings and reviews
    /// and persist the snapshot.
    pub async fn refresh_statistics(
        &self,
        service_id: &VendorServiceId,
    ) -> Result<ServiceStatistics, Error> {
        let bookings = self.repository.list_bookings(service_id).await?;
        let reviews = self.repository.list_reviews(service_id).await?;

        let statistics = ServiceStatistics::recompute(&bookings, &reviews);
        self.repository
            .update_statistics(service_id, &statistics)
            .await?;

        Ok(statistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockVendorRepository {
        services: Mutex<HashMap<VendorServiceId, VendorService>>,
        bookings: Mutex<HashMap<BookingId, ServiceBooking>>,
        reviews: Mutex<Vec<Review>>,
    }

    #[async_trait]
    impl VendorRepository for MockVendorRepository {
        async fn create_service(&self, service: &VendorService) -> Result<VendorService, Error> {
            self.services
                .lock()
                .await
                .insert(service.id.clone(), service.clone());
            Ok(service.clone())
        }

        async fn find_service(
            &self,
            id: &VendorServiceId,
        ) -> Result<Option<VendorService>, Error> {
            Ok(self.services.lock().await.get(id).cloned())
        }

        async fn update_service(&self, service: &VendorService) -> Result<VendorService, Error> {
            self.services
                .lock()
                .await
                .insert(service.id.clone(), service.clone());
            Ok(service.clone())
        }

        async fn delete_service(&self, id: &VendorServiceId) -> Result<(), Error> {
            self.services.lock().await.remove(id);
            Ok(())
        }

        async fn list_services(&self, page: PageRequest) -> Result<Page<VendorService>, Error> {
            let services = self.services.lock().await;
            let items: Vec<_> = services.values().cloned().collect();
            let total = items.len() as u64;
            Ok(Page::new(items, total, page))
        }

        async fn create_booking(&self, booking: &ServiceBooking) -> Result<ServiceBooking, Error> {
            self.bookings
                .lock()
                .await
                .insert(booking.id.clone(), booking.clone());
            Ok(booking.clone())
        }

        async fn find_booking(&self, id: &BookingId) -> Result<Option<ServiceBooking>, Error> {
            Ok(self.bookings.lock().await.get(id).cloned())
        }

        async fn update_booking_status(
            &self,
            id: &BookingId,
            status: BookingStatus,
        ) -> Result<(), Error> {
            let mut bookings = self.bookings.lock().await;
            let booking = bookings
                .get_mut(id)
                .ok_or(Error::Storage(StorageError::NotFound))?;
            booking.status = status;
            Ok(())
        }

        async fn list_bookings(
            &self,
            id: &VendorServiceId,
        ) -> Result<Vec<ServiceBooking>, Error> {
            Ok(self
                .bookings
                .lock()
                .await
                .values()
                .filter(|b| &b.service_id == id)
                .cloned()
                .collect())
        }

        async fn create_review(&self, review: &NewReview) -> Result<Review, Error> {
            let mut reviews = self.reviews.lock().await;
            let stored = Review {
                id: reviews.len() as i64 + 1,
                service_id: review.service_id.clone(),
                user_id: review.user_id.clone(),
                rating: review.rating,
                comment: review.comment.clone(),
                created_at: Utc::now(),
            };
            reviews.push(stored.clone());
            Ok(stored)
        }

        async fn list_reviews(&self, id: &VendorServiceId) -> Result<Vec<Review>, Error> {
            Ok(self
                .reviews
                .lock()
                .await
                .iter()
                .filter(|r| &r.service_id == id)
                .cloned()
                .collect())
        }

        async fn update_statistics(
            &self,
            id: &VendorServiceId,
            statistics: &ServiceStatistics,
        ) -> Result<(), Error> {
            let mut services = self.services.lock().await;
            let service = services
                .get_mut(id)
                .ok_or(Error::Storage(StorageError::NotFound))?;
            service.statistics = statistics.clone();
            Ok(())
        }
    }

    fn service() -> (
        Arc<MockVendorRepository>,
        BookingService<MockVendorRepository>,
    ) {
        let repo = Arc::new(MockVendorRepository::default());
        (repo.clone(), BookingService::new(repo))
    }

    #[tokio::test]
    async fn test_booking_refreshes_statistics() {
        let (repo, bookings) = service();

        let offering = bookings
            .create_service(
                &UserId::new_random(),
                "Drone photography",
                "Aerial shots for listings",
                "photography",
                150_00,
            )
            .await
            .unwrap();

        bookings
            .book(&offering.id, &UserId::new_random(), Utc::now())
            .await
            .unwrap();

        let stored = repo.find_service(&offering.id).await.unwrap().unwrap();
        assert_eq!(stored.statistics.total_bookings, 1);
        assert_eq!(stored.statistics.completed_bookings, 0);
    }

    #[tokio::test]
    async fn test_completion_and_review_update_statistics() {
        let (repo, bookings) = service();

        let offering = bookings
            .create_service(
                &UserId::new_random(),
                "Home staging",
                "",
                "staging",
                300_00,
            )
            .await
            .unwrap();

        let booking = bookings
            .book(&offering.id, &UserId::new_random(), Utc::now())
            .await
            .unwrap();
        bookings
            .set_booking_status(&booking.id, BookingStatus::Completed)
            .await
            .unwrap();

        bookings
            .add_review(&offering.id, &UserId::new_random(), 5, None)
            .await
            .unwrap();
        bookings
            .add_review(&offering.id, &UserId::new_random(), 4, Some("Solid work".to_string()))
            .await
            .unwrap();

        let stored = repo.find_service(&offering.id).await.unwrap().unwrap();
        assert_eq!(stored.statistics.total_bookings, 1);
        assert_eq!(stored.statistics.completed_bookings, 1);
        assert_eq!(stored.statistics.total_reviews, 2);
        assert_eq!(stored.statistics.average_rating, 4.5);
    }

    #[tokio::test]
    async fn test_review_rating_validated() {
        let (_, bookings) = service();

        let offering = bookings
            .create_service(&UserId::new_random(), "Inspection", "", "inspection", 80_00)
            .await
            .unwrap();

        let result = bookings
            .add_review(&offering.id, &UserId::new_random(), 6, None)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_booking_unknown_service_errors() {
        let (_, bookings) = service();
        let result = bookings
            .book(&VendorServiceId::new_random(), &UserId::new_random(), Utc::now())
            .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Storage(StorageError::NotFound)
        ));
    }
}
