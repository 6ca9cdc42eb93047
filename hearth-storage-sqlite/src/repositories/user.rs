use async_trait::async_trait;
use hearth_core::{
    Error, User, UserId, UserRole,
    repositories::{Page, PageRequest, UserRepository},
    user::NewUser,
};
use sqlx::SqlitePool;

use crate::{datetime_from_timestamp, optional_datetime_from_timestamp, storage_error};

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteUser {
    id: String,
    name: Option<String>,
    email: String,
    role: String,
    email_verified_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteUser> for User {
    type Error = Error;

    fn try_from(row: SqliteUser) -> Result<Self, Error> {
        Ok(User {
            id: UserId::new(&row.id),
            name: row.name,
            email: row.email,
            role: UserRole::parse(&row.role)?,
            email_verified_at: optional_datetime_from_timestamp(row.email_verified_at)?,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, role, email_verified_at, created_at, updated_at";

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let now = chrono::Utc::now().timestamp();
        let email_verified_timestamp = user.email_verified_at.map(|dt| dt.timestamp());

        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            INSERT INTO users (id, email, name, role, email_verified_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, name, email, role, email_verified_at, created_at, updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(email_verified_timestamp)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to create user"))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get user"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get user by email"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_or_create_by_email(&self, email: &str) -> Result<User, Error> {
        if let Some(user) = self.find_by_email(email).await? {
            Ok(user)
        } else {
            let new_user = NewUser::new(email.to_string());
            self.create(new_user).await
        }
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        let now = chrono::Utc::now().timestamp();
        let email_verified_timestamp = user.email_verified_at.map(|dt| dt.timestamp());

        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            UPDATE users
            SET email = ?2, name = ?3, role = ?4, email_verified_at = ?5, updated_at = ?6
            WHERE id = ?1
            RETURNING id, name, email, role, email_verified_at, created_at, updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(email_verified_timestamp)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to update user"))?;

        row.try_into()
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete user"))?;

        Ok(())
    }

    async fn mark_email_verified(&self, user_id: &UserId) -> Result<(), Error> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query("UPDATE users SET email_verified_at = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(now)
            .bind(now)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to mark email verified"))?;

        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<User>, Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to count users"))?;

        let rows = sqlx::query_as::<_, SqliteUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list users"))?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as u64, page))
    }
}
