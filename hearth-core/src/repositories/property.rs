use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    property::{ListingKind, Property, PropertyId, PropertyStatus, PropertyType},
    repositories::{Page, PageRequest},
    user::UserId,
};

/// Filters for listing searches. All fields are conjunctive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub status: Option<PropertyStatus>,
    pub type_key: Option<String>,
    pub listing: Option<ListingKind>,
    pub city: Option<String>,
    pub owner_id: Option<UserId>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
}

/// Repository for property listings and property types.
#[async_trait]
pub trait PropertyRepository: Send + Sync + 'static {
    /// Persist a new property
    async fn create(&self, property: &Property) -> Result<Property, Error>;

    /// Find a property by ID
    async fn find_by_id(&self, id: &PropertyId) -> Result<Option<Property>, Error>;

    /// Update an existing property
    async fn update(&self, property: &Property) -> Result<Property, Error>;

    /// Delete a property by ID
    async fn delete(&self, id: &PropertyId) -> Result<(), Error>;

    /// Update only a property's status
    async fn update_status(&self, id: &PropertyId, status: PropertyStatus) -> Result<(), Error>;

    /// List properties matching a filter, newest first
    async fn list(&self, filter: &PropertyFilter, page: PageRequest)
    -> Result<Page<Property>, Error>;

    /// Count a user's properties in a given status
    async fn count_for_owner(&self, owner_id: &UserId, status: PropertyStatus)
    -> Result<u64, Error>;

    /// Persist a property type, replacing any existing type with the same key
    async fn upsert_type(&self, property_type: &PropertyType) -> Result<(), Error>;

    /// Find a property type by key
    async fn find_type(&self, key: &str) -> Result<Option<PropertyType>, Error>;

    /// List all property types
    async fn list_types(&self) -> Result<Vec<PropertyType>, Error>;

    /// Delete a property type by key
    async fn delete_type(&self, key: &str) -> Result<(), Error>;
}
