//! Listing service.
//!
//! Creation and updates validate the listing's dynamic attribute map
//! against its admin-configured property type before anything is
//! persisted, so storage never holds a listing that contradicts its type.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{
    Error,
    error::{StorageError, ValidationError},
    property::{ListingKind, Property, PropertyId, PropertyStatus, PropertyType},
    repositories::{Page, PageRequest, PropertyFilter, PropertyRepository, SettingsRepository},
    user::UserId,
};

/// Parameters for creating or replacing a listing.
#[derive(Debug, Clone)]
pub struct ListingInput {
    pub title: String,
    pub description: String,
    pub type_key: String,
    pub listing: ListingKind,
    pub price_cents: i64,
    pub currency: String,
    pub city: String,
    pub address: String,
    pub attributes: Map<String, Value>,
}

/// Service for property listings and property types.
pub struct PropertyService<R: PropertyRepository, S: SettingsRepository> {
    repository: Arc<R>,
    settings: Arc<S>,
}

impl<R: PropertyRepository, S: SettingsRepository> PropertyService<R, S> {
    /// Create a new PropertyService with the given repositories
    pub fn new(repository: Arc<R>, settings: Arc<S>) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Create a listing owned by `owner_id`.
    ///
    /// The attribute map is validated against the property type; the
    /// initial status honors the marketplace's approval setting.
    pub async fn create_listing(
        &self,
        owner_id: &UserId,
        input: ListingInput,
    ) -> Result<Property, Error> {
        let property_type = self.require_type(&input.type_key).await?;
        property_type.validate_attributes(&input.attributes)?;

        let settings = self.settings.get_or_create().await?;
        let status = if settings.listings.require_approval {
            PropertyStatus::Pending
        } else {
            PropertyStatus::Active
        };

        let property = Property::builder()
            .owner_id(owner_id.clone())
            .title(input.title)
            .description(input.description)
            .type_key(input.type_key)
            .listing(input.listing)
            .price_cents(input.price_cents)
            .currency(input.currency)
            .city(input.city)
            .address(input.address)
            .status(status)
            .attributes(input.attributes)
            .build()?;

        self.repository.create(&property).await
    }

    /// Get a listing by ID
    pub async fn get_listing(&self, id: &PropertyId) -> Result<Option<Property>, Error> {
        self.repository.find_by_id(id).await
    }

    /// Replace a listing's content, revalidating its attributes
    pub async fn update_listing(
        &self,
        id: &PropertyId,
        input: ListingInput,
    ) -> Result<Property, Error> {
        let mut property = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;

        let property_type = self.require_type(&input.type_key).await?;
        property_type.validate_attributes(&input.attributes)?;

        if input.price_cents < 0 {
            return Err(
                ValidationError::InvalidField("Price must not be negative".to_string()).into(),
            );
        }

        property.title = input.title;
        property.description = input.description;
        property.type_key = input.type_key;
        property.listing = input.listing;
        property.price_cents = input.price_cents;
        property.currency = input.currency;
        property.city = input.city;
        property.address = input.address;
        property.attributes = input.attributes;

        self.repository.update(&property).await
    }

    /// Delete a listing
    pub async fn delete_listing(&self, id: &PropertyId) -> Result<(), Error> {
        self.repository.delete(id).await
    }

    /// Update a listing's status
    pub async fn set_status(&self, id: &PropertyId, status: PropertyStatus) -> Result<(), Error> {
        self.repository.update_status(id, status).await
    }

    /// Search listings with a filter, newest first
    pub async fn search(
        &self,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> Result<Page<Property>, Error> {
        self.repository.list(filter, page).await
    }

    /// Count an owner's listings in a status
    pub async fn count_for_owner(
        &self,
        owner_id: &UserId,
        status: PropertyStatus,
    ) -> Result<u64, Error> {
        self.repository.count_for_owner(owner_id, status).await
    }

    /// Create or replace a property type
    pub async fn upsert_type(&self, property_type: &PropertyType) -> Result<(), Error> {
        if property_type.key.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "Property type key is required".to_string(),
            )
            .into());
        }
        self.repository.upsert_type(property_type).await
    }

    /// Get a property type by key
    pub async fn get_type(&self, key: &str) -> Result<Option<PropertyType>, Error> {
        self.repository.find_type(key).await
    }

    /// List all property types
    pub async fn list_types(&self) -> Result<Vec<PropertyType>, Error> {
        self.repository.list_types().await
    }

    /// Delete a property type
    pub async fn delete_type(&self, key: &str) -> Result<(), Error> {
        self.repository.delete_type(key).await
    }

    async fn require_type(&self, key: &str) -> Result<PropertyType, Error> {
        self.repository.find_type(key).await?.ok_or_else(|| {
            ValidationError::InvalidField(format!("Unknown property type: {key}")).into()
        })
    }
}
