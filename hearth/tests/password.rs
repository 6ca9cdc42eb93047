use std::sync::Arc;

use hearth::{Hearth, UserRole};
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

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_register_user_with_password() {
    let hearth = setup_hearth().await;

    let email = "test@example.com";
    let password = "password123";
    let user = hearth
        .register_user_with_password(email, password, None, UserRole::Buyer)
        .await
        .unwrap();

    assert_eq!(user.email, email);
    assert_eq!(user.role, UserRole::Buyer);
    assert!(!user.is_email_verified());

    hearth.set_user_email_verified(&user.id).await.unwrap();

    let user = hearth.get_user(&user.id).await.unwrap().unwrap();
    assert!(user.is_email_verified());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_login_with_password() {
    let hearth = setup_hearth().await;

    let email = "test@example.com";
    let password = "password123";
    hearth
        .register_user_with_password(email, password, None, UserRole::Buyer)
        .await
        .unwrap();

    let (user, session) = hearth
        .login_user_with_password(email, password, Some("test-agent".to_string()), None)
        .await
        .unwrap();

    assert_eq!(user.email, email);

    // The session token resolves back to the same user
    let stored = hearth.get_session(&session.token).await.unwrap();
    assert_eq!(stored.user_id, user.id);
    assert_eq!(stored.user_agent.as_deref(), Some("test-agent"));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let hearth = setup_hearth().await;

    hearth
        .register_user_with_password("test@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    let result = hearth
        .login_user_with_password("test@example.com", "not-the-password", None, None)
        .await;
    assert!(result.is_err());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_change_password_invalidates_sessions() {
    let hearth = setup_hearth().await;

    let email = "test@example.com";
    hearth
        .register_user_with_password(email, "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    let (user, session) = hearth
        .login_user_with_password(email, "password123", None, None)
        .await
        .unwrap();

    hearth
        .change_user_password(&user.id, "password123", "new-password456")
        .await
        .unwrap();

    // The old session is gone
    assert!(hearth.get_session(&session.token).await.is_err());

    // The old password no longer works, the new one does
    assert!(
        hearth
            .login_user_with_password(email, "password123", None, None)
            .await
            .is_err()
    );
    assert!(
        hearth
            .login_user_with_password(email, "new-password456", None, None)
            .await
            .is_ok()
    );
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_logout_deletes_session() {
    let hearth = setup_hearth().await;

    hearth
        .register_user_with_password("test@example.com", "password123", None, UserRole::Buyer)
        .await
        .unwrap();

    let (_, session) = hearth
        .login_user_with_password("test@example.com", "password123", None, None)
        .await
        .unwrap();

    hearth.delete_session(&session.token).await.unwrap();
    assert!(hearth.get_session(&session.token).await.is_err());
}
