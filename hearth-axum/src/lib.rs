//! # Hearth Axum Integration
//!
//! This crate provides Axum routes and middleware for the Hearth
//! marketplace backend: cookie/Bearer session authentication, the
//! lockout-aware login flow (locked pairs receive `423 LOCKED` with a
//! `retry_after_minutes` hint), listing search and CRUD, support ticket
//! threads, and the admin configuration endpoints.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hearth::Hearth;
//! use hearth_storage_sqlite::SqliteRepositoryProvider;
//! use hearth_axum::CookieConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = sqlx::SqlitePool::connect("sqlite:hearth.db").await.unwrap();
//!     let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
//!     let hearth = Arc::new(Hearth::new(repositories));
//!     hearth.migrate().await.unwrap();
//!
//!     let app: axum::Router = hearth_axum::routes(hearth)
//!         .with_cookie_config(CookieConfig::development())
//!         .into();
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::{
    AdminUser, AuthUser, OptionalAuthUser, SessionTokenFromCookie, SessionTokenFromRequest,
};
pub use middleware::{AuthState, auth_middleware, require_auth};
pub use routes::create_router;
pub use types::{
    AuthResponse, ChangePasswordRequest, ConnectionInfo, CookieConfig, CookieSameSite,
    CreateListingRequest, HealthResponse, HeroResponse, ListingPageResponse, ListingQuery,
    ListingResponse, LoginRequest, MessageResponse, OpenTicketRequest, PageQuery,
    RegisterRequest, SessionResponse, SettingsResponse, TicketPageResponse, TicketReplyRequest,
    TicketResponse, TicketThreadResponse, UserResponse,
};

use axum::Router;
use hearth::{Hearth, RepositoryProvider};
use std::sync::Arc;

/// Create marketplace routes for your Axum application.
///
/// Returns a builder so cookie behavior can be configured before the
/// router is built. The result can be nested into your application at
/// any path (e.g. `/api`).
pub fn routes<R>(hearth: Arc<Hearth<R>>) -> RouterBuilder<R>
where
    R: RepositoryProvider + 'static,
{
    RouterBuilder {
        hearth,
        cookie_config: CookieConfig::default(),
    }
}

/// Builder for configuring marketplace routes
pub struct RouterBuilder<R: RepositoryProvider> {
    hearth: Arc<Hearth<R>>,
    cookie_config: CookieConfig,
}

impl<R: RepositoryProvider + 'static> RouterBuilder<R> {
    /// Set custom cookie configuration
    pub fn with_cookie_config(mut self, config: CookieConfig) -> Self {
        self.cookie_config = config;
        self
    }

    /// Build the router with the configured options
    pub fn build(self) -> Router {
        create_router(self.hearth, self.cookie_config)
    }
}

impl<R: RepositoryProvider + 'static> From<RouterBuilder<R>> for Router {
    fn from(builder: RouterBuilder<R>) -> Self {
        builder.build()
    }
}
