//! Notification campaign flows over SQLite storage.

use std::sync::Arc;

use hearth::{Hearth, NotificationStatus, UserRole};
use hearth_core::repositories::{PageRequest, RepositoryProvider};

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
#[tokio::test]
async fn test_campaign_statistics_stay_consistent() {
    let hearth = setup_hearth().await;

    let alice = hearth
        .register_user_with_password("alice@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();
    let bob = hearth
        .register_user_with_password("bob@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    let campaign = hearth
        .notifications()
        .create_draft("Open house", "Saturday at 2pm")
        .await
        .unwrap();
    assert_eq!(campaign.status, NotificationStatus::Draft);

    let campaign = hearth
        .notifications()
        .add_recipients(
            &campaign.id,
            vec![
                (alice.id.clone(), alice.email.clone()),
                (bob.id.clone(), bob.email.clone()),
            ],
        )
        .await
        .unwrap();
    assert_eq!(campaign.statistics.total_recipients, 2);
    assert_eq!(campaign.statistics.delivery_rate, 0.0);

    let campaign = hearth
        .notifications()
        .mark_delivered(&campaign.id, &alice.id)
        .await
        .unwrap();
    assert_eq!(campaign.statistics.delivered, 1);
    assert_eq!(campaign.statistics.delivery_rate, 50.0);

    let campaign = hearth
        .notifications()
        .mark_opened(&campaign.id, &alice.id)
        .await
        .unwrap();
    // One of one delivered was opened
    assert_eq!(campaign.statistics.open_rate, 100.0);

    // The stored row agrees with what the service returned
    let stored = hearth
        .notifications()
        .get(&campaign.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.statistics, campaign.statistics);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_rates_defined_without_deliveries() {
    let hearth = setup_hearth().await;

    let user = hearth
        .register_user_with_password("alice@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    let campaign = hearth
        .notifications()
        .create_draft("Subject", "Body")
        .await
        .unwrap();
    let campaign = hearth
        .notifications()
        .add_recipients(&campaign.id, vec![(user.id.clone(), user.email.clone())])
        .await
        .unwrap();

    assert_eq!(campaign.statistics.open_rate, 0.0);
    assert_eq!(campaign.statistics.click_rate, 0.0);
    assert!(!campaign.statistics.open_rate.is_nan());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_campaign_lifecycle_over_storage() {
    let hearth = setup_hearth().await;

    let campaign = hearth
        .notifications()
        .create_draft("Subject", "Body")
        .await
        .unwrap();

    let campaign = hearth
        .notifications()
        .schedule(&campaign.id, chrono::Utc::now() + chrono::Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(campaign.status, NotificationStatus::Scheduled);

    hearth
        .notifications()
        .transition(&campaign.id, NotificationStatus::Sending)
        .await
        .unwrap();
    let campaign = hearth
        .notifications()
        .transition(&campaign.id, NotificationStatus::Sent)
        .await
        .unwrap();
    assert!(campaign.sent_at.is_some());

    // Terminal states reject further transitions
    assert!(
        hearth
            .notifications()
            .transition(&campaign.id, NotificationStatus::Cancelled)
            .await
            .is_err()
    );

    let page = hearth
        .notifications()
        .list(PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}
