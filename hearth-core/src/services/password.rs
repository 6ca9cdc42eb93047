use crate::{
    Error, User, UserId, UserRole,
    error::AuthError,
    repositories::{PasswordRepository, UserRepository},
    services::UserService,
    validation::validate_password,
};
use std::sync::Arc;

/// Service for password authentication operations
pub struct PasswordService<U: UserRepository, P: PasswordRepository> {
    user_service: Arc<UserService<U>>,
    password_repository: Arc<P>,
}

impl<U: UserRepository, P: PasswordRepository> PasswordService<U, P> {
    /// Create a new PasswordService with the given repositories
    pub fn new(user_repository: Arc<U>, password_repository: Arc<P>) -> Self {
        let user_service = Arc::new(UserService::new(user_repository));
        Self {
            user_service,
            password_repository,
        }
    }

    /// Register a new user with a password
    ///
    /// Returns the user whether newly created or already existing. This
    /// prevents user enumeration attacks by not revealing whether an email
    /// is already in use.
    ///
    /// **Security Note:** If the user already exists, their password is
    /// NOT updated. This is intentional to prevent account takeover where
    /// an attacker registers with a victim's email and sets their own
    /// password.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
        role: UserRole,
    ) -> Result<User, Error> {
        // Validate password strength before any other operations
        validate_password(password)?;

        // Check if user already exists - return existing user to prevent enumeration
        if let Some(existing_user) = self.user_service.get_user_by_email(email).await? {
            return Ok(existing_user);
        }

        let password_hash = Self::hash_password(password)?;

        // Create the user (email validation happens in UserService)
        let user = self.user_service.create_user(email, name, role).await?;

        self.password_repository
            .set_password_hash(&user.id, &password_hash)
            .await?;

        Ok(user)
    }

    /// Authenticate a user with email and password
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, Error> {
        let user = self
            .user_service
            .get_user_by_email(email)
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        let password_hash = self
            .password_repository
            .get_password_hash(&user.id)
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        if !Self::verify_password(password, &password_hash)? {
            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        Ok(user)
    }

    /// Change a user's password
    pub async fn change_password(
        &self,
        user_id: &UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        // Validate new password strength before any other operations
        validate_password(new_password)?;

        let current_hash = self
            .password_repository
            .get_password_hash(user_id)
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        if !Self::verify_password(old_password, &current_hash)? {
            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        let new_hash = Self::hash_password(new_password)?;

        self.password_repository
            .set_password_hash(user_id, &new_hash)
            .await?;

        Ok(())
    }

    /// Set a user's password (admin operation, no old password required)
    pub async fn set_password(&self, user_id: &UserId, password: &str) -> Result<(), Error> {
        validate_password(password)?;

        let password_hash = Self::hash_password(password)?;
        self.password_repository
            .set_password_hash(user_id, &password_hash)
            .await
    }

    /// Remove a user's password
    pub async fn remove_password(&self, user_id: &UserId) -> Result<(), Error> {
        self.password_repository.remove_password_hash(user_id).await
    }

    /// Hash a password using argon2
    fn hash_password(password: &str) -> Result<String, Error> {
        use password_auth::generate_hash;
        Ok(generate_hash(password))
    }

    /// Verify a password against a hash
    fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
        use password_auth::verify_password;
        Ok(verify_password(password, hash).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::repositories::{Page, PageRequest};
    use crate::user::NewUser;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockUserRepository {
        users: Arc<Mutex<HashMap<UserId, User>>>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, new_user: NewUser) -> Result<User, Error> {
            let user = User::builder()
                .id(new_user.id)
                .email(new_user.email)
                .name(new_user.name)
                .role(new_user.role)
                .build()?;
            self.users
                .lock()
                .await
                .insert(user.id.clone(), user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
            Ok(self.users.lock().await.get(id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_or_create_by_email(&self, email: &str) -> Result<User, Error> {
            if let Some(user) = self.find_by_email(email).await? {
                Ok(user)
            } else {
                self.create(NewUser::new(email.to_string())).await
            }
        }

        async fn update(&self, _user: &User) -> Result<User, Error> {
            unimplemented!()
        }

        async fn delete(&self, _id: &UserId) -> Result<(), Error> {
            unimplemented!()
        }

        async fn mark_email_verified(&self, _user_id: &UserId) -> Result<(), Error> {
            Ok(())
        }

        async fn list(&self, _page: PageRequest) -> Result<Page<User>, Error> {
            unimplemented!()
        }
    }

    #[derive(Default)]
    struct MockPasswordRepository {
        passwords: Arc<Mutex<HashMap<UserId, String>>>,
    }

    #[async_trait]
    impl PasswordRepository for MockPasswordRepository {
        async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
            self.passwords
                .lock()
                .await
                .insert(user_id.clone(), hash.to_string());
            Ok(())
        }

        async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
            Ok(self.passwords.lock().await.get(user_id).cloned())
        }

        async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
            self.passwords.lock().await.remove(user_id);
            Ok(())
        }
    }

    fn service() -> (
        Arc<MockUserRepository>,
        Arc<MockPasswordRepository>,
        PasswordService<MockUserRepository, MockPasswordRepository>,
    ) {
        let user_repo = Arc::new(MockUserRepository::default());
        let password_repo = Arc::new(MockPasswordRepository::default());
        let service = PasswordService::new(user_repo.clone(), password_repo.clone());
        (user_repo, password_repo, service)
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let (user_repo, _, service) = service();

        let result = service
            .register_user("test@example.com", "weak", None, UserRole::Buyer)
            .await;

        assert!(matches!(
            result.unwrap_err(),
            Error::Validation(ValidationError::WeakPassword)
        ));

        // No user should be created with a weak password
        assert!(user_repo.users.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let (_, password_repo, service) = service();

        let user = service
            .register_user(
                "test@example.com",
                "validpass123",
                Some("Test".to_string()),
                UserRole::Vendor,
            )
            .await
            .unwrap();
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.role, UserRole::Vendor);
        assert!(password_repo.passwords.lock().await.contains_key(&user.id));

        let authed = service
            .authenticate("test@example.com", "validpass123")
            .await
            .unwrap();
        assert_eq!(authed.id, user.id);

        let result = service.authenticate("test@example.com", "wrongpass").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Auth(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_existing_email_keeps_password() {
        let (_, _, service) = service();

        let first = service
            .register_user("test@example.com", "originalpass", None, UserRole::Buyer)
            .await
            .unwrap();

        // Second registration returns the existing user without touching
        // the stored credential
        let second = service
            .register_user("test@example.com", "attackerpass", None, UserRole::Buyer)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        assert!(
            service
                .authenticate("test@example.com", "originalpass")
                .await
                .is_ok()
        );
        assert!(
            service
                .authenticate("test@example.com", "attackerpass")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_change_password() {
        let (_, _, service) = service();

        let user = service
            .register_user("test@example.com", "original_pass", None, UserRole::Buyer)
            .await
            .unwrap();

        service
            .change_password(&user.id, "original_pass", "new_password456")
            .await
            .unwrap();

        assert!(
            service
                .authenticate("test@example.com", "new_password456")
                .await
                .is_ok()
        );
        assert!(
            service
                .authenticate("test@example.com", "original_pass")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_change_password_requires_old_password() {
        let (_, _, service) = service();

        let user = service
            .register_user("test@example.com", "original_pass", None, UserRole::Buyer)
            .await
            .unwrap();

        let result = service
            .change_password(&user.id, "not_the_password", "new_password456")
            .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Auth(AuthError::InvalidCredentials)
        ));
    }
}
