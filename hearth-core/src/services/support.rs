//! Support ticket service.

use std::sync::Arc;

use crate::{
    Error,
    error::{StorageError, ValidationError},
    repositories::{Page, PageRequest, SupportRepository},
    support::{SupportTicket, TicketId, TicketPriority, TicketReply, TicketStatus},
    user::UserId,
};

/// A ticket together with its reply thread, oldest reply first.
#[derive(Debug, Clone)]
pub struct TicketThread {
    pub ticket: SupportTicket,
    pub replies: Vec<TicketReply>,
}

/// Service for support tickets and reply threads.
pub struct SupportService<R: SupportRepository> {
    repository: Arc<R>,
}

impl<R: SupportRepository> SupportService<R> {
    /// Create a new SupportService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Open a ticket for a user
    pub async fn open_ticket(
        &self,
        user_id: &UserId,
        subject: &str,
        body: &str,
        priority: TicketPriority,
    ) -> Result<SupportTicket, Error> {
        let ticket = SupportTicket::open(
            user_id.clone(),
            subject.to_string(),
            body.to_string(),
            priority,
        )?;
        self.repository.create(&ticket).await
    }

    /// Fetch a ticket and its replies
    pub async fn get_thread(&self, id: &TicketId) -> Result<Option<TicketThread>, Error> {
        let Some(ticket) = self.repository.find_by_id(id).await? else {
            return Ok(None);
        };
        let replies = self.repository.list_replies(id).await?;
        Ok(Some(TicketThread { ticket, replies }))
    }

    /// Append a reply and move the ticket between the requester and staff.
    ///
    /// A staff reply moves `Open -> Pending`; a requester reply moves
    /// `Pending -> Open`. Resolved and closed tickets reject replies.
    pub async fn reply(
        &self,
        id: &TicketId,
        author_id: &UserId,
        staff: bool,
        body: &str,
    ) -> Result<TicketReply, Error> {
        if body.trim().is_empty() {
            return Err(ValidationError::MissingField("Reply body is required".to_string()).into());
        }

        let ticket = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;

        if !ticket.status.accepts_replies() {
            return Err(ValidationError::InvalidTransition(format!(
                "Ticket is {} and no longer accepts replies",
                ticket.status
            ))
            .into());
        }

        let reply = self.repository.add_reply(id, author_id, staff, body).await?;

        let next = ticket.status_after_reply(staff);
        if next != ticket.status {
            self.repository.update_status(id, next).await?;
        }

        Ok(reply)
    }

    /// Set a ticket's status directly (resolve, close, reopen)
    pub async fn set_status(&self, id: &TicketId, status: TicketStatus) -> Result<(), Error> {
        let _ = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;
        self.repository.update_status(id, status).await
    }

    /// List all tickets, newest first
    pub async fn list(&self, page: PageRequest) -> Result<Page<SupportTicket>, Error> {
        self.repository.list(page).await
    }

    /// List a user's tickets, newest first
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<SupportTicket>, Error> {
        self.repository.list_for_user(user_id, page).await
    }
}
