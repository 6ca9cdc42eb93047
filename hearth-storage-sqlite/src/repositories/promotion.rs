use async_trait::async_trait;
use chrono::Utc;
use hearth_core::{
    Error, UserId,
    promotion::{PromotionId, PromotionRequest, PromotionStatus},
    property::PropertyId,
    repositories::{Page, PageRequest, PromotionRepository},
};
use sqlx::SqlitePool;

use crate::{datetime_from_timestamp, storage_error};

pub struct SqlitePromotionRepository {
    pool: SqlitePool,
}

impl SqlitePromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqlitePromotion {
    id: String,
    property_id: String,
    requested_by: String,
    starts_at: i64,
    ends_at: i64,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqlitePromotion> for PromotionRequest {
    type Error = Error;

    fn try_from(row: SqlitePromotion) -> Result<Self, Error> {
        Ok(PromotionRequest {
            id: PromotionId::new(&row.id),
            property_id: PropertyId::new(&row.property_id),
            requested_by: UserId::new(&row.requested_by),
            starts_at: datetime_from_timestamp(row.starts_at)?,
            ends_at: datetime_from_timestamp(row.ends_at)?,
            status: PromotionStatus::parse(&row.status)?,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

const PROMOTION_COLUMNS: &str =
    "id, property_id, requested_by, starts_at, ends_at, status, created_at, updated_at";

#[async_trait]
impl PromotionRepository for SqlitePromotionRepository {
    async fn create(&self, request: &PromotionRequest) -> Result<PromotionRequest, Error> {
        let row = sqlx::query_as::<_, SqlitePromotion>(&format!(
            r#"
            INSERT INTO promotion_requests
                (id, property_id, requested_by, starts_at, ends_at, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING {PROMOTION_COLUMNS}
            "#
        ))
        .bind(request.id.as_str())
        .bind(request.property_id.as_str())
        .bind(request.requested_by.as_str())
        .bind(request.starts_at.timestamp())
        .bind(request.ends_at.timestamp())
        .bind(request.status.as_str())
        .bind(request.created_at.timestamp())
        .bind(request.updated_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to create promotion request"))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &PromotionId) -> Result<Option<PromotionRequest>, Error> {
        let row = sqlx::query_as::<_, SqlitePromotion>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotion_requests WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get promotion request"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_status(&self, id: &PromotionId, status: PromotionStatus) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query("UPDATE promotion_requests SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update promotion status"))?;

        Ok(())
    }

    async fn list_by_status(
        &self,
        status: PromotionStatus,
        page: PageRequest,
    ) -> Result<Page<PromotionRequest>, Error> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM promotion_requests WHERE status = ?1")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(storage_error("Failed to count promotion requests"))?;

        let rows = sqlx::query_as::<_, SqlitePromotion>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotion_requests WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(status.as_str())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list promotion requests"))?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as u64, page))
    }

    async fn list_for_property(&self, id: &PropertyId) -> Result<Vec<PromotionRequest>, Error> {
        let rows = sqlx::query_as::<_, SqlitePromotion>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotion_requests WHERE property_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list property promotions"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
