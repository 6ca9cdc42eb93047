use std::sync::Arc;

use chrono::Duration;

use crate::{
    Error,
    error::SessionError,
    repositories::SessionRepository,
    session::{Session, SessionToken},
    user::UserId,
};

/// Service for session lifecycle management.
///
/// Sessions are opaque tokens backed by storage; an expired session is
/// treated as absent and removed on sight.
pub struct SessionService<R: SessionRepository> {
    repository: Arc<R>,
}

impl<R: SessionRepository> SessionService<R> {
    /// Create a new SessionService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a session for a user, expiring after `expires_in`
    pub async fn create_session(
        &self,
        user_id: &UserId,
        user_agent: Option<String>,
        ip_address: Option<String>,
        expires_in: Duration,
    ) -> Result<Session, Error> {
        let session = Session::builder()
            .user_id(user_id.clone())
            .user_agent(user_agent)
            .ip_address(ip_address)
            .expires_in(expires_in)
            .build()?;

        self.repository.create(&session).await
    }

    /// Get a session by token, removing it if it has expired
    pub async fn get_session(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        let Some(session) = self.repository.find_by_token(token).await? else {
            return Ok(None);
        };

        if session.is_expired() {
            self.repository.delete(token).await?;
            return Err(SessionError::Expired.into());
        }

        Ok(Some(session))
    }

    /// Delete a session by token
    pub async fn delete_session(&self, token: &SessionToken) -> Result<(), Error> {
        self.repository.delete(token).await
    }

    /// Delete all sessions for a user
    pub async fn delete_user_sessions(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.delete_for_user(user_id).await
    }

    /// Remove expired sessions, returning the count removed
    pub async fn cleanup_expired(&self) -> Result<u64, Error> {
        self.repository.delete_expired().await
    }
}
