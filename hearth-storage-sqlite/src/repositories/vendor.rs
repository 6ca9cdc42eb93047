use async_trait::async_trait;
use chrono::Utc;
use hearth_core::{
    Error, UserId,
    error::StorageError,
    repositories::{Page, PageRequest, VendorRepository},
    vendor::{
        BookingId, BookingStatus, NewReview, Review, ServiceBooking, ServiceStatistics,
        VendorService, VendorServiceId,
    },
};
use sqlx::SqlitePool;

use crate::{datetime_from_timestamp, storage_error};

pub struct SqliteVendorRepository {
    pool: SqlitePool,
}

impl SqliteVendorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteVendorService {
    id: String,
    vendor_id: String,
    name: String,
    description: String,
    category: String,
    price_cents: i64,
    statistics: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteVendorService> for VendorService {
    type Error = Error;

    fn try_from(row: SqliteVendorService) -> Result<Self, Error> {
        let statistics: ServiceStatistics =
            serde_json::from_str(&row.statistics).map_err(|e| {
                tracing::error!(error = %e, "Corrupt service statistics column");
                Error::Storage(StorageError::Database(
                    "Corrupt service statistics".to_string(),
                ))
            })?;

        Ok(VendorService {
            id: VendorServiceId::new(&row.id),
            vendor_id: UserId::new(&row.vendor_id),
            name: row.name,
            description: row.description,
            category: row.category,
            price_cents: row.price_cents,
            statistics,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteBooking {
    id: String,
    service_id: String,
    user_id: String,
    scheduled_for: i64,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteBooking> for ServiceBooking {
    type Error = Error;

    fn try_from(row: SqliteBooking) -> Result<Self, Error> {
        Ok(ServiceBooking {
            id: BookingId::new(&row.id),
            service_id: VendorServiceId::new(&row.service_id),
            user_id: UserId::new(&row.user_id),
            scheduled_for: datetime_from_timestamp(row.scheduled_for)?,
            status: BookingStatus::parse(&row.status)?,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteReview {
    id: i64,
    service_id: String,
    user_id: String,
    rating: i64,
    comment: Option<String>,
    created_at: i64,
}

impl TryFrom<SqliteReview> for Review {
    type Error = Error;

    fn try_from(row: SqliteReview) -> Result<Self, Error> {
        Ok(Review {
            id: row.id,
            service_id: VendorServiceId::new(&row.service_id),
            user_id: UserId::new(&row.user_id),
            rating: row.rating as u8,
            comment: row.comment,
            created_at: datetime_from_timestamp(row.created_at)?,
        })
    }
}

fn statistics_json(statistics: &ServiceStatistics) -> Result<String, Error> {
    serde_json::to_string(statistics).map_err(|e| {
        Error::Storage(StorageError::Database(format!(
            "Failed to serialize statistics: {e}"
        )))
    })
}

const SERVICE_COLUMNS: &str =
    "id, vendor_id, name, description, category, price_cents, statistics, created_at, updated_at";

const BOOKING_COLUMNS: &str =
    "id, service_id, user_id, scheduled_for, status, created_at, updated_at";

#[async_trait]
impl VendorRepository for SqliteVendorRepository {
    async fn create_service(&self, service: &VendorService) -> Result<VendorService, Error> {
        let row = sqlx::query_as::<_, SqliteVendorService>(&format!(
            r#"
            INSERT INTO vendor_services
                (id, vendor_id, name, description, category, price_cents, statistics, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(service.id.as_str())
        .bind(service.vendor_id.as_str())
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.category)
        .bind(service.price_cents)
        .bind(statistics_json(&service.statistics)?)
        .bind(service.created_at.timestamp())
        .bind(service.updated_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to create vendor service"))?;

        row.try_into()
    }

    async fn find_service(&self, id: &VendorServiceId) -> Result<Option<VendorService>, Error> {
        let row = sqlx::query_as::<_, SqliteVendorService>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM vendor_services WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get vendor service"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_service(&self, service: &VendorService) -> Result<VendorService, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteVendorService>(&format!(
            r#"
            UPDATE vendor_services
            SET name = ?2, description = ?3, category = ?4, price_cents = ?5, updated_at = ?6
            WHERE id = ?1
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(service.id.as_str())
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.category)
        .bind(service.price_cents)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to update vendor service"))?;

        row.try_into()
    }

    async fn delete_service(&self, id: &VendorServiceId) -> Result<(), Error> {
        sqlx::query("DELETE FROM service_reviews WHERE service_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete service reviews"))?;

        sqlx::query("DELETE FROM service_bookings WHERE service_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete service bookings"))?;

        sqlx::query("DELETE FROM vendor_services WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete vendor service"))?;

        Ok(())
    }

    async fn list_services(&self, page: PageRequest) -> Result<Page<VendorService>, Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendor_services")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to count vendor services"))?;

        let rows = sqlx::query_as::<_, SqliteVendorService>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM vendor_services ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list vendor services"))?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as u64, page))
    }

    async fn create_booking(&self, booking: &ServiceBooking) -> Result<ServiceBooking, Error> {
        let row = sqlx::query_as::<_, SqliteBooking>(&format!(
            r#"
            INSERT INTO service_bookings (id, service_id, user_id, scheduled_for, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking.id.as_str())
        .bind(booking.service_id.as_str())
        .bind(booking.user_id.as_str())
        .bind(booking.scheduled_for.timestamp())
        .bind(booking.status.as_str())
        .bind(booking.created_at.timestamp())
        .bind(booking.updated_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to create booking"))?;

        row.try_into()
    }

    async fn find_booking(&self, id: &BookingId) -> Result<Option<ServiceBooking>, Error> {
        let row = sqlx::query_as::<_, SqliteBooking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM service_bookings WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get booking"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_booking_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query("UPDATE service_bookings SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update booking status"))?;

        Ok(())
    }

    async fn list_bookings(&self, id: &VendorServiceId) -> Result<Vec<ServiceBooking>, Error> {
        let rows = sqlx::query_as::<_, SqliteBooking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM service_bookings WHERE service_id = ?1 ORDER BY created_at"
        ))
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list bookings"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteReview>(
            r#"
            INSERT INTO service_reviews (service_id, user_id, rating, comment, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, service_id, user_id, rating, comment, created_at
            "#,
        )
        .bind(review.service_id.as_str())
        .bind(review.user_id.as_str())
        .bind(i64::from(review.rating))
        .bind(&review.comment)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to create review"))?;

        row.try_into()
    }

    async fn list_reviews(&self, id: &VendorServiceId) -> Result<Vec<Review>, Error> {
        let rows = sqlx::query_as::<_, SqliteReview>(
            r#"
            SELECT id, service_id, user_id, rating, comment, created_at
            FROM service_reviews
            WHERE service_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list reviews"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_statistics(
        &self,
        id: &VendorServiceId,
        statistics: &ServiceStatistics,
    ) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query("UPDATE vendor_services SET statistics = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(statistics_json(statistics)?)
            .bind(now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update service statistics"))?;

        Ok(())
    }
}
