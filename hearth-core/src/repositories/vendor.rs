use async_trait::async_trait;

use crate::{
    Error,
    repositories::{Page, PageRequest},
    user::UserId,
    vendor::{
        BookingId, BookingStatus, NewReview, Review, ServiceBooking, ServiceStatistics,
        VendorService, VendorServiceId,
    },
};

/// Repository for vendor service offerings, bookings and reviews.
#[async_trait]
pub trait VendorRepository: Send + Sync + 'static {
    /// Persist a new service offering
    async fn create_service(&self, service: &VendorService) -> Result<VendorService, Error>;

    /// Find a service by ID
    async fn find_service(&self, id: &VendorServiceId) -> Result<Option<VendorService>, Error>;

    /// Update a service offering
    async fn update_service(&self, service: &VendorService) -> Result<VendorService, Error>;

    /// Delete a service offering with its bookings and reviews
    async fn delete_service(&self, id: &VendorServiceId) -> Result<(), Error>;

    /// List services, newest first
    async fn list_services(&self, page: PageRequest) -> Result<Page<VendorService>, Error>;

    /// Persist a new booking
    async fn create_booking(&self, booking: &ServiceBooking) -> Result<ServiceBooking, Error>;

    /// Find a booking by ID
    async fn find_booking(&self, id: &BookingId) -> Result<Option<ServiceBooking>, Error>;

    /// Update a booking's status
    async fn update_booking_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<(), Error>;

    /// Fetch all bookings for a service
    async fn list_bookings(&self, id: &VendorServiceId) -> Result<Vec<ServiceBooking>, Error>;

    /// Persist a review, returning it with its assigned ID
    async fn create_review(&self, review: &NewReview) -> Result<Review, Error>;

    /// Fetch all reviews for a service
    async fn list_reviews(&self, id: &VendorServiceId) -> Result<Vec<Review>, Error>;

    /// Replace the stored statistics snapshot for a service
    async fn update_statistics(
        &self,
        id: &VendorServiceId,
        statistics: &ServiceStatistics,
    ) -> Result<(), Error>;
}
