//! SQLite implementation of the property repository.
//!
//! Dynamic listing attributes and property-type field definitions are
//! stored as JSON text; search filters compose into a WHERE clause with
//! positional parameters.

use async_trait::async_trait;
use chrono::Utc;
use hearth_core::{
    Error, UserId,
    error::StorageError,
    property::{
        FieldDefinition, ListingKind, Property, PropertyId, PropertyStatus, PropertyType,
    },
    repositories::{Page, PageRequest, PropertyFilter, PropertyRepository},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{datetime_from_timestamp, storage_error};

pub struct SqlitePropertyRepository {
    pool: SqlitePool,
}

impl SqlitePropertyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteProperty {
    id: String,
    owner_id: String,
    title: String,
    description: String,
    type_key: String,
    listing: String,
    price_cents: i64,
    currency: String,
    city: String,
    address: String,
    status: String,
    attributes: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteProperty> for Property {
    type Error = Error;

    fn try_from(row: SqliteProperty) -> Result<Self, Error> {
        let attributes = serde_json::from_str(&row.attributes).map_err(|e| {
            tracing::error!(error = %e, "Corrupt property attributes column");
            Error::Storage(StorageError::Database(
                "Corrupt property attributes".to_string(),
            ))
        })?;

        Ok(Property {
            id: PropertyId::new(&row.id),
            owner_id: UserId::new(&row.owner_id),
            title: row.title,
            description: row.description,
            type_key: row.type_key,
            listing: ListingKind::parse(&row.listing)?,
            price_cents: row.price_cents,
            currency: row.currency,
            city: row.city,
            address: row.address,
            status: PropertyStatus::parse(&row.status)?,
            attributes,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqlitePropertyType {
    key: String,
    label: String,
    fields: String,
}

impl TryFrom<SqlitePropertyType> for PropertyType {
    type Error = Error;

    fn try_from(row: SqlitePropertyType) -> Result<Self, Error> {
        let fields: Vec<FieldDefinition> = serde_json::from_str(&row.fields).map_err(|e| {
            tracing::error!(error = %e, "Corrupt property type fields column");
            Error::Storage(StorageError::Database(
                "Corrupt property type fields".to_string(),
            ))
        })?;

        Ok(PropertyType {
            key: row.key,
            label: row.label,
            fields,
        })
    }
}

const PROPERTY_COLUMNS: &str = "id, owner_id, title, description, type_key, listing, \
     price_cents, currency, city, address, status, attributes, created_at, updated_at";

/// Append a filter's predicates to a query builder.
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &PropertyFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(type_key) = &filter.type_key {
        builder.push(" AND type_key = ").push_bind(type_key.clone());
    }
    if let Some(listing) = filter.listing {
        builder.push(" AND listing = ").push_bind(listing.as_str());
    }
    if let Some(city) = &filter.city {
        builder.push(" AND city = ").push_bind(city.clone());
    }
    if let Some(owner_id) = &filter.owner_id {
        builder
            .push(" AND owner_id = ")
            .push_bind(owner_id.as_str().to_string());
    }
    if let Some(min) = filter.min_price_cents {
        builder.push(" AND price_cents >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price_cents {
        builder.push(" AND price_cents <= ").push_bind(max);
    }
}

fn attributes_json(property: &Property) -> Result<String, Error> {
    serde_json::to_string(&property.attributes).map_err(|e| {
        Error::Storage(StorageError::Database(format!(
            "Failed to serialize attributes: {e}"
        )))
    })
}

#[async_trait]
impl PropertyRepository for SqlitePropertyRepository {
    async fn create(&self, property: &Property) -> Result<Property, Error> {
        let row = sqlx::query_as::<_, SqliteProperty>(&format!(
            r#"
            INSERT INTO properties
                (id, owner_id, title, description, type_key, listing, price_cents,
                 currency, city, address, status, attributes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(property.id.as_str())
        .bind(property.owner_id.as_str())
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.type_key)
        .bind(property.listing.as_str())
        .bind(property.price_cents)
        .bind(&property.currency)
        .bind(&property.city)
        .bind(&property.address)
        .bind(property.status.as_str())
        .bind(attributes_json(property)?)
        .bind(property.created_at.timestamp())
        .bind(property.updated_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to create property"))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &PropertyId) -> Result<Option<Property>, Error> {
        let row = sqlx::query_as::<_, SqliteProperty>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get property"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update(&self, property: &Property) -> Result<Property, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteProperty>(&format!(
            r#"
            UPDATE properties
            SET title = ?2, description = ?3, type_key = ?4, listing = ?5,
                price_cents = ?6, currency = ?7, city = ?8, address = ?9,
                status = ?10, attributes = ?11, updated_at = ?12
            WHERE id = ?1
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(property.id.as_str())
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.type_key)
        .bind(property.listing.as_str())
        .bind(property.price_cents)
        .bind(&property.currency)
        .bind(&property.city)
        .bind(&property.address)
        .bind(property.status.as_str())
        .bind(attributes_json(property)?)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to update property"))?;

        row.try_into()
    }

    async fn delete(&self, id: &PropertyId) -> Result<(), Error> {
        sqlx::query("DELETE FROM properties WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete property"))?;

        Ok(())
    }

    async fn update_status(&self, id: &PropertyId, status: PropertyStatus) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query("UPDATE properties SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update property status"))?;

        Ok(())
    }

    async fn list(
        &self,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> Result<Page<Property>, Error> {
        let mut count_builder =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM properties WHERE 1=1");
        push_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to count properties"))?;

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE 1=1"
        ));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let rows = builder
            .build_query_as::<SqliteProperty>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("Failed to list properties"))?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as u64, page))
    }

    async fn count_for_owner(
        &self,
        owner_id: &UserId,
        status: PropertyStatus,
    ) -> Result<u64, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM properties WHERE owner_id = ?1 AND status = ?2",
        )
        .bind(owner_id.as_str())
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to count owner properties"))?;

        Ok(count as u64)
    }

    async fn upsert_type(&self, property_type: &PropertyType) -> Result<(), Error> {
        let fields = serde_json::to_string(&property_type.fields).map_err(|e| {
            Error::Storage(StorageError::Database(format!(
                "Failed to serialize field definitions: {e}"
            )))
        })?;

        sqlx::query(
            r#"
            INSERT INTO property_types (key, label, fields)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET label = excluded.label, fields = excluded.fields
            "#,
        )
        .bind(&property_type.key)
        .bind(&property_type.label)
        .bind(fields)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to upsert property type"))?;

        Ok(())
    }

    async fn find_type(&self, key: &str) -> Result<Option<PropertyType>, Error> {
        let row = sqlx::query_as::<_, SqlitePropertyType>(
            "SELECT key, label, fields FROM property_types WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get property type"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_types(&self) -> Result<Vec<PropertyType>, Error> {
        let rows = sqlx::query_as::<_, SqlitePropertyType>(
            "SELECT key, label, fields FROM property_types ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list property types"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_type(&self, key: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM property_types WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete property type"))?;

        Ok(())
    }
}
