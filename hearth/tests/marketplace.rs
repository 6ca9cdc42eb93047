//! Marketplace flows over SQLite storage: listings, bookings, reviews,
//! promotions and support tickets.

use std::sync::Arc;

use chrono::{Duration, Utc};
use hearth::{Hearth, UserRole};
use hearth_core::{
    property::{FieldDefinition, FieldKind, ListingKind, PropertyStatus, PropertyType},
    repositories::{PageRequest, PropertyFilter, RepositoryProvider},
    services::property::ListingInput,
    support::{TicketPriority, TicketStatus},
    vendor::BookingStatus,
};
use serde_json::json;

#[cfg(feature = "sqlite")]
use hearth::SqliteRepositoryProvider;

#[cfg(feature = "sqlite")]
async fn setup_hearth() -> Hearth<SqliteRepositoryProvider> {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    let repositories = SqliteRepositoryProvider::new(pool);
    repositories.migrate().await.unwrap();
    Hearth::new(Arc::new(repositories))
}

#[cfg(feature = "sqlite")]
async fn register_vendor(hearth: &Hearth<SqliteRepositoryProvider>) -> hearth::User {
    hearth
        .register_user_with_password(
            "vendor@example.com",
            "password123",
            Some("Vendor".to_string()),
            UserRole::Vendor,
        )
        .await
        .unwrap()
}

#[cfg(feature = "sqlite")]
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
        ],
    }
}

#[cfg(feature = "sqlite")]
fn listing_input(city: &str, price_cents: i64) -> ListingInput {
    ListingInput {
        title: "Sunny two-bed".to_string(),
        description: "Top floor, lots of light".to_string(),
        type_key: "apartment".to_string(),
        listing: ListingKind::Sale,
        price_cents,
        currency: "USD".to_string(),
        city: city.to_string(),
        address: "12 Main St".to_string(),
        attributes: json!({"bedrooms": 2, "furnished": true})
            .as_object()
            .unwrap()
            .clone(),
    }
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_listing_lifecycle() {
    let hearth = setup_hearth().await;
    let vendor = register_vendor(&hearth).await;

    hearth.properties().upsert_type(&apartment_type()).await.unwrap();

    let property = hearth
        .properties()
        .create_listing(&vendor.id, listing_input("Lisbon", 250_000_00))
        .await
        .unwrap();

    // Default settings require approval, so new listings start pending
    assert_eq!(property.status, PropertyStatus::Pending);

    hearth
        .properties()
        .set_status(&property.id, PropertyStatus::Active)
        .await
        .unwrap();

    let filter = PropertyFilter {
        city: Some("Lisbon".to_string()),
        status: Some(PropertyStatus::Active),
        ..Default::default()
    };
    let page = hearth
        .properties()
        .search(&filter, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, property.id);

    // A filter that misses returns an empty page
    let filter = PropertyFilter {
        city: Some("Porto".to_string()),
        ..Default::default()
    };
    let page = hearth
        .properties()
        .search(&filter, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_listing_attributes_validated_against_type() {
    let hearth = setup_hearth().await;
    let vendor = register_vendor(&hearth).await;

    hearth.properties().upsert_type(&apartment_type()).await.unwrap();

    let mut input = listing_input("Lisbon", 100_00);
    input.attributes = json!({"furnished": true}).as_object().unwrap().clone();

    // Missing the required bedrooms attribute
    let result = hearth.properties().create_listing(&vendor.id, input).await;
    assert!(result.is_err());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_booking_review_statistics_flow() {
    let hearth = setup_hearth().await;
    let vendor = register_vendor(&hearth).await;
    let buyer = hearth
        .register_user_with_password("buyer@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    let offering = hearth
        .bookings()
        .create_service(&vendor.id, "Drone photos", "Aerial shots", "photography", 150_00)
        .await
        .unwrap();

    let booking = hearth
        .bookings()
        .book(&offering.id, &buyer.id, Utc::now() + Duration::days(2))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    hearth
        .bookings()
        .set_booking_status(&booking.id, BookingStatus::Completed)
        .await
        .unwrap();

    hearth
        .bookings()
        .add_review(&offering.id, &buyer.id, 5, Some("Great shots".to_string()))
        .await
        .unwrap();

    let stored = hearth.bookings().get_service(&offering.id).await.unwrap().unwrap();
    assert_eq!(stored.statistics.total_bookings, 1);
    assert_eq!(stored.statistics.completed_bookings, 1);
    assert_eq!(stored.statistics.total_reviews, 1);
    assert_eq!(stored.statistics.average_rating, 5.0);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_promotion_request_flow() {
    let hearth = setup_hearth().await;
    let vendor = register_vendor(&hearth).await;

    hearth.properties().upsert_type(&apartment_type()).await.unwrap();
    let property = hearth
        .properties()
        .create_listing(&vendor.id, listing_input("Lisbon", 250_000_00))
        .await
        .unwrap();

    let now = Utc::now();

    // An inverted window is rejected up front
    assert!(
        hearth
            .promotions()
            .request(&property.id, &vendor.id, now + Duration::days(7), now + Duration::days(1))
            .await
            .is_err()
    );

    let request = hearth
        .promotions()
        .request(&property.id, &vendor.id, now + Duration::days(1), now + Duration::days(8))
        .await
        .unwrap();

    let pending = hearth
        .promotions()
        .list_pending(PageRequest::default())
        .await
        .unwrap();
    assert_eq!(pending.total, 1);

    let approved = hearth.promotions().approve(&request.id).await.unwrap();
    assert_eq!(
        approved.status,
        hearth_core::promotion::PromotionStatus::Approved
    );

    // A second decision on the same request is rejected
    assert!(hearth.promotions().reject(&request.id).await.is_err());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_support_ticket_thread() {
    let hearth = setup_hearth().await;
    let buyer = hearth
        .register_user_with_password("buyer@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();
    let admin = hearth
        .register_user_with_password("admin@example.com", "password123", None, UserRole::Admin)
        .await
        .unwrap();

    let ticket = hearth
        .support()
        .open_ticket(
            &buyer.id,
            "Cannot publish listing",
            "The publish button reports an error",
            TicketPriority::High,
        )
        .await
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);

    // Staff reply hands the ticket to the requester
    hearth
        .support()
        .reply(&ticket.id, &admin.id, true, "Which listing is affected?")
        .await
        .unwrap();
    let thread = hearth.support().get_thread(&ticket.id).await.unwrap().unwrap();
    assert_eq!(thread.ticket.status, TicketStatus::Pending);
    assert_eq!(thread.replies.len(), 1);

    // Requester reply hands it back
    hearth
        .support()
        .reply(&ticket.id, &buyer.id, false, "The one in Lisbon")
        .await
        .unwrap();
    let thread = hearth.support().get_thread(&ticket.id).await.unwrap().unwrap();
    assert_eq!(thread.ticket.status, TicketStatus::Open);
    assert_eq!(thread.replies.len(), 2);

    // Resolving stops the thread
    hearth
        .support()
        .set_status(&ticket.id, TicketStatus::Resolved)
        .await
        .unwrap();
    assert!(
        hearth
            .support()
            .reply(&ticket.id, &buyer.id, false, "One more thing")
            .await
            .is_err()
    );
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_subscription_flow() {
    let hearth = setup_hearth().await;
    let vendor = register_vendor(&hearth).await;

    hearth
        .subscriptions()
        .upsert_plan(&hearth_core::subscription::SubscriptionPlan {
            key: "vendor-pro".to_string(),
            name: "Vendor Pro".to_string(),
            price_cents: 49_00,
            period_days: 30,
            max_active_listings: 50,
        })
        .await
        .unwrap();
    hearth
        .subscriptions()
        .upsert_addon(&hearth_core::subscription::Addon {
            key: "featured-badge".to_string(),
            name: "Featured badge".to_string(),
            price_cents: 9_00,
        })
        .await
        .unwrap();

    let subscription = hearth
        .subscriptions()
        .subscribe(&vendor.id, "vendor-pro")
        .await
        .unwrap();
    assert_eq!(
        subscription.status,
        hearth_core::subscription::SubscriptionStatus::Active
    );

    let subscription = hearth
        .subscriptions()
        .attach_addon(&vendor.id, "featured-badge")
        .await
        .unwrap();
    assert!(subscription.has_addon("featured-badge"));

    let cancelled = hearth.subscriptions().cancel(&vendor.id).await.unwrap();
    assert_eq!(
        cancelled.status,
        hearth_core::subscription::SubscriptionStatus::Cancelled
    );

    // Cancelling twice is invalid
    assert!(hearth.subscriptions().cancel(&vendor.id).await.is_err());
}
