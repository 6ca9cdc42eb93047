use hearth::{
    HeroSettings, ListingKind, Page, PageRequest, Property, Session, Settings, SupportTicket,
    User, UserRole,
};
use hearth_core::support::{TicketPriority, TicketReply};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateListingRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub type_key: String,
    pub listing: ListingKind,
    pub price_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Query parameters for listing searches, the `page`/`per_page` convention.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub type_key: Option<String>,
    #[serde(default)]
    pub listing: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub min_price_cents: Option<i64>,
    #[serde(default)]
    pub max_price_cents: Option<i64>,
}

impl ListingQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(PageRequest::DEFAULT_PER_PAGE),
        )
    }
}

/// Bare pagination query for endpoints without filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(PageRequest::DEFAULT_PER_PAGE),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenTicketRequest {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReplyRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingResponse {
    pub property: Property,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingPageResponse {
    pub properties: Vec<Property>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl From<Page<Property>> for ListingPageResponse {
    fn from(page: Page<Property>) -> Self {
        Self {
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            properties: page.items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketResponse {
    pub ticket: SupportTicket,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketThreadResponse {
    pub ticket: SupportTicket,
    pub replies: Vec<TicketReply>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketPageResponse {
    pub tickets: Vec<SupportTicket>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl From<Page<SupportTicket>> for TicketPageResponse {
    fn from(page: Page<SupportTicket>) -> Self {
        Self {
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            tickets: page.items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeroResponse {
    pub hero: HeroSettings,
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: CookieSameSite,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session_id".to_string(),
            http_only: true,
            secure: true,
            same_site: CookieSameSite::Lax,
            path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum CookieSameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl CookieConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn development() -> Self {
        Self {
            secure: false,
            ..Self::default()
        }
    }
}
