use crate::{Error, user::UserId};
use async_trait::async_trait;

/// Repository for password hash storage
#[async_trait]
pub trait PasswordRepository: Send + Sync + 'static {
    /// Store or replace a user's password hash
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error>;

    /// Retrieve a user's password hash
    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error>;

    /// Remove a user's password hash
    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error>;
}
