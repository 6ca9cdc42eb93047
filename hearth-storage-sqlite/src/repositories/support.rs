use async_trait::async_trait;
use chrono::Utc;
use hearth_core::{
    Error, UserId,
    repositories::{Page, PageRequest, SupportRepository},
    support::{SupportTicket, TicketId, TicketPriority, TicketReply, TicketStatus},
};
use sqlx::SqlitePool;

use crate::{datetime_from_timestamp, storage_error};

pub struct SqliteSupportRepository {
    pool: SqlitePool,
}

impl SqliteSupportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteTicket {
    id: String,
    user_id: String,
    subject: String,
    body: String,
    status: String,
    priority: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteTicket> for SupportTicket {
    type Error = Error;

    fn try_from(row: SqliteTicket) -> Result<Self, Error> {
        Ok(SupportTicket {
            id: TicketId::new(&row.id),
            user_id: UserId::new(&row.user_id),
            subject: row.subject,
            body: row.body,
            status: TicketStatus::parse(&row.status)?,
            priority: TicketPriority::parse(&row.priority)?,
            created_at: datetime_from_timestamp(row.created_at)?,
            updated_at: datetime_from_timestamp(row.updated_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteReply {
    id: i64,
    ticket_id: String,
    author_id: String,
    staff: bool,
    body: String,
    created_at: i64,
}

impl TryFrom<SqliteReply> for TicketReply {
    type Error = Error;

    fn try_from(row: SqliteReply) -> Result<Self, Error> {
        Ok(TicketReply {
            id: row.id,
            ticket_id: TicketId::new(&row.ticket_id),
            author_id: UserId::new(&row.author_id),
            staff: row.staff,
            body: row.body,
            created_at: datetime_from_timestamp(row.created_at)?,
        })
    }
}

const TICKET_COLUMNS: &str =
    "id, user_id, subject, body, status, priority, created_at, updated_at";

#[async_trait]
impl SupportRepository for SqliteSupportRepository {
    async fn create(&self, ticket: &SupportTicket) -> Result<SupportTicket, Error> {
        let row = sqlx::query_as::<_, SqliteTicket>(&format!(
            r#"
            INSERT INTO support_tickets (id, user_id, subject, body, status, priority, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(ticket.id.as_str())
        .bind(ticket.user_id.as_str())
        .bind(&ticket.subject)
        .bind(&ticket.body)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.created_at.timestamp())
        .bind(ticket.updated_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to create ticket"))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<SupportTicket>, Error> {
        let row = sqlx::query_as::<_, SqliteTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get ticket"))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_status(&self, id: &TicketId, status: TicketStatus) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query("UPDATE support_tickets SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update ticket status"))?;

        Ok(())
    }

    async fn add_reply(
        &self,
        id: &TicketId,
        author_id: &UserId,
        staff: bool,
        body: &str,
    ) -> Result<TicketReply, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteReply>(
            r#"
            INSERT INTO ticket_replies (ticket_id, author_id, staff, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, ticket_id, author_id, staff, body, created_at
            "#,
        )
        .bind(id.as_str())
        .bind(author_id.as_str())
        .bind(staff)
        .bind(body)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to add ticket reply"))?;

        row.try_into()
    }

    async fn list_replies(&self, id: &TicketId) -> Result<Vec<TicketReply>, Error> {
        let rows = sqlx::query_as::<_, SqliteReply>(
            r#"
            SELECT id, ticket_id, author_id, staff, body, created_at
            FROM ticket_replies
            WHERE ticket_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list ticket replies"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list(&self, page: PageRequest) -> Result<Page<SupportTicket>, Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM support_tickets")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to count tickets"))?;

        let rows = sqlx::query_as::<_, SqliteTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list tickets"))?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as u64, page))
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<SupportTicket>, Error> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM support_tickets WHERE user_id = ?1")
                .bind(user_id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(storage_error("Failed to count user tickets"))?;

        let rows = sqlx::query_as::<_, SqliteTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(user_id.as_str())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list user tickets"))?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as u64, page))
    }
}
