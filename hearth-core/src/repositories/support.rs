use async_trait::async_trait;

use crate::{
    Error,
    repositories::{Page, PageRequest},
    support::{SupportTicket, TicketId, TicketReply, TicketStatus},
    user::UserId,
};

/// Repository for support tickets and their reply threads.
#[async_trait]
pub trait SupportRepository: Send + Sync + 'static {
    /// Persist a new ticket
    async fn create(&self, ticket: &SupportTicket) -> Result<SupportTicket, Error>;

    /// Find a ticket by ID
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<SupportTicket>, Error>;

    /// Update a ticket's status
    async fn update_status(&self, id: &TicketId, status: TicketStatus) -> Result<(), Error>;

    /// Append a reply to a ticket's thread, returning it with its assigned ID
    async fn add_reply(
        &self,
        id: &TicketId,
        author_id: &UserId,
        staff: bool,
        body: &str,
    ) -> Result<TicketReply, Error>;

    /// Fetch a ticket's replies, oldest first
    async fn list_replies(&self, id: &TicketId) -> Result<Vec<TicketReply>, Error>;

    /// List all tickets, newest first
    async fn list(&self, page: PageRequest) -> Result<Page<SupportTicket>, Error>;

    /// List a user's tickets, newest first
    async fn list_for_user(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<SupportTicket>, Error>;
}
