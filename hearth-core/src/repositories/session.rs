use crate::{
    Error,
    session::{Session, SessionToken},
    user::UserId,
};
use async_trait::async_trait;

/// Repository for session data access
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Persist a new session
    async fn create(&self, session: &Session) -> Result<Session, Error>;

    /// Find a session by its token
    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error>;

    /// Delete a session by its token
    async fn delete(&self, token: &SessionToken) -> Result<(), Error>;

    /// Delete all sessions belonging to a user
    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), Error>;

    /// Delete sessions whose expiry has passed, returning the count removed
    async fn delete_expired(&self) -> Result<u64, Error>;
}
