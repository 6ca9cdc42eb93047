//! End-to-end lockout behavior over SQLite storage.

use std::sync::Arc;

use hearth::{Hearth, HearthError, UserRole};
use hearth_core::repositories::RepositoryProvider;

#[cfg(feature = "sqlite")]
use hearth::SqliteRepositoryProvider;

#[cfg(feature = "sqlite")]
async fn setup_hearth() -> Hearth<SqliteRepositoryProvider> {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    let repositories = SqliteRepositoryProvider::new(pool);
    repositories.migrate().await.unwrap();
    Hearth::new(Arc::new(repositories))
}

/// Tighten the lockout policy so tests lock quickly.
#[cfg(feature = "sqlite")]
async fn set_max_attempts(hearth: &Hearth<SqliteRepositoryProvider>, max_attempts: u32) {
    let mut settings = hearth.settings().get().await.unwrap();
    settings.security.max_login_attempts = max_attempts;
    hearth.settings().update(&settings).await.unwrap();
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_lockout_after_repeated_failures() {
    let hearth = setup_hearth().await;
    set_max_attempts(&hearth, 3).await;

    hearth
        .register_user_with_password("bob@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    let ip = Some("1.2.3.4".to_string());

    // Two failures stay plain auth errors
    for _ in 0..2 {
        let result = hearth
            .login_user_with_password("bob@example.com", "wrong", None, ip.clone())
            .await;
        assert!(matches!(result.unwrap_err(), HearthError::AuthError(_)));
    }

    // The third failure crosses the threshold and reports the lock
    let result = hearth
        .login_user_with_password("bob@example.com", "wrong", None, ip.clone())
        .await;
    match result.unwrap_err() {
        HearthError::AccountLocked {
            retry_after_minutes,
        } => {
            assert!(retry_after_minutes > 0 && retry_after_minutes <= 30);
        }
        e => panic!("Expected AccountLocked, got {e:?}"),
    }

    // Even the correct password is rejected while locked
    let result = hearth
        .login_user_with_password("bob@example.com", "password123", None, ip)
        .await;
    assert!(matches!(
        result.unwrap_err(),
        HearthError::AccountLocked { .. }
    ));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_lockout_is_per_ip() {
    let hearth = setup_hearth().await;
    set_max_attempts(&hearth, 2).await;

    hearth
        .register_user_with_password("bob@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    for _ in 0..2 {
        let _ = hearth
            .login_user_with_password(
                "bob@example.com",
                "wrong",
                None,
                Some("1.2.3.4".to_string()),
            )
            .await;
    }

    // The pair from the attacking address is locked
    assert!(matches!(
        hearth
            .login_user_with_password(
                "bob@example.com",
                "password123",
                None,
                Some("1.2.3.4".to_string())
            )
            .await
            .unwrap_err(),
        HearthError::AccountLocked { .. }
    ));

    // Bob can still log in from his own address
    assert!(
        hearth
            .login_user_with_password(
                "bob@example.com",
                "password123",
                None,
                Some("5.6.7.8".to_string())
            )
            .await
            .is_ok()
    );
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_successful_login_resets_counter() {
    let hearth = setup_hearth().await;
    set_max_attempts(&hearth, 3).await;

    hearth
        .register_user_with_password("bob@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    let ip = Some("1.2.3.4".to_string());

    // Two failures, then a success
    for _ in 0..2 {
        let _ = hearth
            .login_user_with_password("bob@example.com", "wrong", None, ip.clone())
            .await;
    }
    hearth
        .login_user_with_password("bob@example.com", "password123", None, ip.clone())
        .await
        .unwrap();

    // The counter restarted: two more failures still do not lock
    for _ in 0..2 {
        let result = hearth
            .login_user_with_password("bob@example.com", "wrong", None, ip.clone())
            .await;
        assert!(matches!(result.unwrap_err(), HearthError::AuthError(_)));
    }
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_admin_reset_unlocks() {
    let hearth = setup_hearth().await;
    set_max_attempts(&hearth, 2).await;

    hearth
        .register_user_with_password("bob@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    for _ in 0..2 {
        let _ = hearth
            .login_user_with_password(
                "bob@example.com",
                "wrong",
                None,
                Some("1.2.3.4".to_string()),
            )
            .await;
    }
    assert!(
        hearth
            .lockout()
            .is_locked("bob@example.com", "1.2.3.4")
            .await
            .unwrap()
    );

    hearth
        .lockout()
        .reset("bob@example.com", "1.2.3.4")
        .await
        .unwrap();

    assert!(
        hearth
            .login_user_with_password(
                "bob@example.com",
                "password123",
                None,
                Some("1.2.3.4".to_string())
            )
            .await
            .is_ok()
    );
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_unknown_emails_are_tracked_too() {
    // Failed attempts against nonexistent accounts still count, so probing
    // cannot distinguish real users by lockout behavior.
    let hearth = setup_hearth().await;
    set_max_attempts(&hearth, 2).await;

    for _ in 0..2 {
        let _ = hearth
            .login_user_with_password(
                "ghost@example.com",
                "anything",
                None,
                Some("1.2.3.4".to_string()),
            )
            .await;
    }

    let result = hearth
        .login_user_with_password(
            "ghost@example.com",
            "anything",
            None,
            Some("1.2.3.4".to_string()),
        )
        .await;
    assert!(matches!(
        result.unwrap_err(),
        HearthError::AccountLocked { .. }
    ));
}
