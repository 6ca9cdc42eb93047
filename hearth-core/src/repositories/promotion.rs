use async_trait::async_trait;

use crate::{
    Error,
    promotion::{PromotionId, PromotionRequest, PromotionStatus},
    property::PropertyId,
    repositories::{Page, PageRequest},
};

/// Repository for listing promotion requests.
#[async_trait]
pub trait PromotionRepository: Send + Sync + 'static {
    /// Persist a new promotion request
    async fn create(&self, request: &PromotionRequest) -> Result<PromotionRequest, Error>;

    /// Find a request by ID
    async fn find_by_id(&self, id: &PromotionId) -> Result<Option<PromotionRequest>, Error>;

    /// Update a request's status
    async fn update_status(&self, id: &PromotionId, status: PromotionStatus) -> Result<(), Error>;

    /// List requests in a status, newest first
    async fn list_by_status(
        &self,
        status: PromotionStatus,
        page: PageRequest,
    ) -> Result<Page<PromotionRequest>, Error>;

    /// Fetch all requests for a property, newest first
    async fn list_for_property(&self, id: &PropertyId) -> Result<Vec<PromotionRequest>, Error>;
}
