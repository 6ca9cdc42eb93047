//! Property listings and admin-defined property types
//!
//! A property type (apartment, villa, office, plot, …) is an
//! admin-configured record whose field definitions drive the dynamic part
//! of a listing: each property carries a JSON attribute map that must
//! validate against its type's definitions before it is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    user::UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct PropertyId(String);

impl PropertyId {
    pub fn new(id: &str) -> Self {
        PropertyId(id.to_string())
    }

    pub fn new_random() -> Self {
        PropertyId(generate_prefixed_id("prop"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "prop")
    }
}

impl Default for PropertyId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for PropertyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a listing is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Sale,
    Rent,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Sale => "sale",
            ListingKind::Rent => "rent",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "sale" => Ok(ListingKind::Sale),
            "rent" => Ok(ListingKind::Rent),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown listing kind: {other}"
            ))),
        }
    }
}

/// Listing lifecycle. New listings start `Pending` when the marketplace
/// requires approval, `Active` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Pending,
    Active,
    Sold,
    Rented,
    Archived,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Pending => "pending",
            PropertyStatus::Active => "active",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "rented",
            PropertyStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(PropertyStatus::Pending),
            "active" => Ok(PropertyStatus::Active),
            "sold" => Ok(PropertyStatus::Sold),
            "rented" => Ok(PropertyStatus::Rented),
            "archived" => Ok(PropertyStatus::Archived),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown property status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of value a dynamic field accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Select { options: Vec<String> },
}

/// One admin-defined field on a property type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldDefinition {
    /// Validate a single attribute value against this definition.
    fn validate_value(&self, value: &Value) -> Result<(), ValidationError> {
        let ok = match &self.kind {
            FieldKind::Text => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Select { options } => value
                .as_str()
                .is_some_and(|s| options.iter().any(|o| o == s)),
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::InvalidField(format!(
                "Attribute '{}' does not match its field definition",
                self.key
            )))
        }
    }
}

/// An admin-configured property type with its dynamic field definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    /// Stable key referenced by listings, e.g. `apartment`.
    pub key: String,
    pub label: String,
    pub fields: Vec<FieldDefinition>,
}

impl PropertyType {
    /// Validate a listing's attribute map against these definitions.
    ///
    /// Required fields must be present; present values must match their
    /// field kind; attributes without a definition are rejected.
    pub fn validate_attributes(&self, attributes: &Map<String, Value>) -> Result<(), Error> {
        for field in &self.fields {
            match attributes.get(&field.key) {
                Some(value) => field.validate_value(value)?,
                None if field.required => {
                    return Err(ValidationError::MissingField(format!(
                        "Attribute '{}' is required for type '{}'",
                        field.key, self.key
                    ))
                    .into());
                }
                None => {}
            }
        }

        for key in attributes.keys() {
            if !self.fields.iter().any(|f| &f.key == key) {
                return Err(ValidationError::InvalidField(format!(
                    "Attribute '{key}' is not defined for type '{}'",
                    self.key
                ))
                .into());
            }
        }

        Ok(())
    }
}

/// A property listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    /// Key of the admin-configured property type.
    pub type_key: String,
    pub listing: ListingKind,
    /// Price in minor currency units (cents).
    pub price_cents: i64,
    pub currency: String,
    pub city: String,
    pub address: String,
    pub status: PropertyStatus,
    /// Dynamic attributes validated against the property type.
    pub attributes: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn builder() -> PropertyBuilder {
        PropertyBuilder::default()
    }
}

#[derive(Default)]
pub struct PropertyBuilder {
    id: Option<PropertyId>,
    owner_id: Option<UserId>,
    title: Option<String>,
    description: Option<String>,
    type_key: Option<String>,
    listing: Option<ListingKind>,
    price_cents: Option<i64>,
    currency: Option<String>,
    city: Option<String>,
    address: Option<String>,
    status: Option<PropertyStatus>,
    attributes: Option<Map<String, Value>>,
}

impl PropertyBuilder {
    pub fn id(mut self, id: PropertyId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn owner_id(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn type_key(mut self, type_key: String) -> Self {
        self.type_key = Some(type_key);
        self
    }

    pub fn listing(mut self, listing: ListingKind) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn price_cents(mut self, price_cents: i64) -> Self {
        self.price_cents = Some(price_cents);
        self
    }

    pub fn currency(mut self, currency: String) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn city(mut self, city: String) -> Self {
        self.city = Some(city);
        self
    }

    pub fn address(mut self, address: String) -> Self {
        self.address = Some(address);
        self
    }

    pub fn status(mut self, status: PropertyStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn build(self) -> Result<Property, Error> {
        let title = self.title.ok_or(ValidationError::MissingField(
            "Title is required".to_string(),
        ))?;
        if title.trim().is_empty() {
            return Err(ValidationError::MissingField("Title is required".to_string()).into());
        }

        let price_cents = self.price_cents.unwrap_or(0);
        if price_cents < 0 {
            return Err(
                ValidationError::InvalidField("Price must not be negative".to_string()).into(),
            );
        }

        let now = Utc::now();
        Ok(Property {
            id: self.id.unwrap_or_default(),
            owner_id: self.owner_id.ok_or(ValidationError::MissingField(
                "Owner is required".to_string(),
            ))?,
            title,
            description: self.description.unwrap_or_default(),
            type_key: self.type_key.ok_or(ValidationError::MissingField(
                "Property type is required".to_string(),
            ))?,
            listing: self.listing.unwrap_or(ListingKind::Sale),
            price_cents,
            currency: self.currency.unwrap_or_else(|| "USD".to_string()),
            city: self.city.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            status: self.status.unwrap_or(PropertyStatus::Pending),
            attributes: self.attributes.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apartment_type() -> PropertyType {
        PropertyType {
            key: "apartment".to_string(),
            label: "Apartment".to_string(),
            fields: vec![
                FieldDefinition {
                    key: "bedrooms".to_string(),
                    label: "Bedrooms".to_string(),
                    kind: FieldKind::Number,
                    required: true,
                },
                FieldDefinition {
                    key: "furnished".to_string(),
                    label: "Furnished".to_string(),
                    kind: FieldKind::Boolean,
                    required: false,
                },
                FieldDefinition {
                    key: "heating".to_string(),
                    label: "Heating".to_string(),
                    kind: FieldKind::Select {
                        options: vec!["gas".to_string(), "electric".to_string()],
                    },
                    required: false,
                },
            ],
        }
    }

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_valid_attributes() {
        let t = apartment_type();
        let a = attrs(json!({"bedrooms": 3, "furnished": true, "heating": "gas"}));
        assert!(t.validate_attributes(&a).is_ok());
    }

    #[test]
    fn test_missing_required_attribute() {
        let t = apartment_type();
        let a = attrs(json!({"furnished": true}));
        assert!(t.validate_attributes(&a).is_err());
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let t = apartment_type();
        let a = attrs(json!({"bedrooms": "three"}));
        assert!(t.validate_attributes(&a).is_err());
    }

    #[test]
    fn test_select_value_must_be_in_options() {
        let t = apartment_type();
        let a = attrs(json!({"bedrooms": 2, "heating": "coal"}));
        assert!(t.validate_attributes(&a).is_err());
    }

    #[test]
    fn test_undefined_attribute_rejected() {
        let t = apartment_type();
        let a = attrs(json!({"bedrooms": 2, "pool": true}));
        assert!(t.validate_attributes(&a).is_err());
    }

    #[test]
    fn test_property_builder_defaults() {
        let property = Property::builder()
            .owner_id(UserId::new_random())
            .title("Two-bed flat".to_string())
            .type_key("apartment".to_string())
            .price_cents(250_000_00)
            .build()
            .unwrap();
        assert_eq!(property.status, PropertyStatus::Pending);
        assert_eq!(property.listing, ListingKind::Sale);
        assert!(property.id.is_valid());
    }

    #[test]
    fn test_property_builder_rejects_negative_price() {
        let result = Property::builder()
            .owner_id(UserId::new_random())
            .title("Flat".to_string())
            .type_key("apartment".to_string())
            .price_cents(-1)
            .build();
        assert!(result.is_err());
    }
}
