//! Promotion request service.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Error,
    error::{StorageError, ValidationError},
    promotion::{PromotionId, PromotionRequest, PromotionStatus},
    property::PropertyId,
    repositories::{Page, PageRequest, PromotionRepository, PropertyRepository},
    user::UserId,
};

/// Service for listing promotion requests.
pub struct PromotionService<R: PromotionRepository, P: PropertyRepository> {
    repository: Arc<R>,
    properties: Arc<P>,
}

impl<R: PromotionRepository, P: PropertyRepository> PromotionService<R, P> {
    /// Create a new PromotionService with the given repositories
    pub fn new(repository: Arc<R>, properties: Arc<P>) -> Self {
        Self {
            repository,
            properties,
        }
    }

    /// Request a promotion window for a listing.
    ///
    /// The date range is validated in the model constructor, so inverted
    /// or already-ended windows are rejected before touching storage.
    pub async fn request(
        &self,
        property_id: &PropertyId,
        requested_by: &UserId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<PromotionRequest, Error> {
        let _ = self
            .properties
            .find_by_id(property_id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;

        let request =
            PromotionRequest::new(property_id.clone(), requested_by.clone(), starts_at, ends_at)?;
        self.repository.create(&request).await
    }

    /// Approve a pending request
    pub async fn approve(&self, id: &PromotionId) -> Result<PromotionRequest, Error> {
        self.decide(id, PromotionStatus::Approved).await
    }

    /// Reject a pending request
    pub async fn reject(&self, id: &PromotionId) -> Result<PromotionRequest, Error> {
        self.decide(id, PromotionStatus::Rejected).await
    }

    /// List requests awaiting a decision, newest first
    pub async fn list_pending(&self, page: PageRequest) -> Result<Page<PromotionRequest>, Error> {
        self.repository
            .list_by_status(PromotionStatus::Pending, page)
            .await
    }

    /// All requests ever made for a listing
    pub async fn history_for_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<PromotionRequest>, Error> {
        self.repository.list_for_property(property_id).await
    }

    async fn decide(
        &self,
        id: &PromotionId,
        decision: PromotionStatus,
    ) -> Result<PromotionRequest, Error> {
        let mut request = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;

        if request.status != PromotionStatus::Pending {
            return Err(ValidationError::InvalidTransition(format!(
                "Promotion request is already {}",
                request.status
            ))
            .into());
        }

        self.repository.update_status(id, decision).await?;
        request.status = decision;
        Ok(request)
    }
}
