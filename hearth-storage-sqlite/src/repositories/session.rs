use async_trait::async_trait;
use hearth_core::{
    Error, UserId,
    repositories::SessionRepository,
    session::{Session, SessionToken},
};
use sqlx::SqlitePool;

use crate::{datetime_from_timestamp, storage_error};

pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteSession {
    token: String,
    user_id: String,
    user_agent: Option<String>,
    ip_address: Option<String>,
    expires_at: i64,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteSession> for Session {
    type Error = Error;

    fn try_from(row: SqliteSession) -> Result<Self, Error> {
        Ok(Session {
            token: SessionToken::new(&row.token),
            user_id: UserId::new(&row.user_id),
            user_agent: row.user_agent,
            ip_address: row.ip_address,
            expires_at: datetime_from_timestamp(row.expires_at)?,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session, Error> {
        let row = sqlx::query_as::<_, SqliteSession>(
            r#"
            INSERT INTO sessions (token, user_id, user_agent, ip_address, expires_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING token, user_id, user_agent, ip_address, expires_at, created_at, updated_at
            "#,
        )
        .bind(session.token.as_str())
        .bind(session.user_id.as_str())
        .bind(&session.user_agent)
        .bind(&session.ip_address)
        .bind(session.expires_at.timestamp())
        .bind(session.created_at.timestamp())
        .bind(session.updated_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to create session"))?;

        row.try_into()
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        let row = sqlx::query_as::<_, SqliteSession>(
            r#"
            SELECT token, user_id, user_agent, ip_address, expires_at, created_at, updated_at
            FROM sessions
            WHERE token = ?1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get session"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete session"))?;

        Ok(())
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete user sessions"))?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, Error> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete expired sessions"))?;

        Ok(result.rows_affected())
    }
}
