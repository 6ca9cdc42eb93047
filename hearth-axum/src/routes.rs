use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use hearth::{Hearth, HeroSettings, PropertyStatus, RepositoryProvider, Settings, UserRole};
use hearth_core::{
    property::PropertyId,
    repositories::PropertyFilter,
    services::property::ListingInput,
    support::{TicketId, TicketPriority, TicketStatus},
};

use crate::{
    error::{ApiError, Result},
    extractors::{AdminUser, AuthUser, OptionalAuthUser, SessionTokenFromRequest},
    middleware::{AuthState, auth_middleware},
    types::*,
};

pub fn create_router<R>(hearth: Arc<Hearth<R>>, cookie_config: CookieConfig) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = AuthState { hearth };

    let auth_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler).delete(logout_handler))
        .route("/session", get(get_session_handler).delete(logout_handler))
        .route("/user", get(get_user_handler))
        .route("/password", post(change_password_handler));

    let listing_routes = Router::new()
        .route("/properties", get(search_listings_handler).post(create_listing_handler))
        .route(
            "/properties/{id}",
            get(get_listing_handler)
                .put(update_listing_handler)
                .delete(delete_listing_handler),
        )
        .route("/property-types", get(list_property_types_handler));

    let ticket_routes = Router::new()
        .route("/tickets", get(list_my_tickets_handler).post(open_ticket_handler))
        .route("/tickets/{id}", get(get_ticket_handler))
        .route("/tickets/{id}/replies", post(reply_ticket_handler));

    let admin_routes = Router::new()
        .route(
            "/admin/settings",
            get(get_settings_handler).put(update_settings_handler),
        )
        .route("/admin/hero", put(update_hero_handler))
        .route("/admin/tickets", get(list_all_tickets_handler))
        .route("/admin/tickets/{id}/status", put(set_ticket_status_handler))
        .route(
            "/admin/properties/{id}/status",
            put(set_listing_status_handler),
        );

    let public_routes = Router::new().route("/hero", get(get_hero_handler));

    Router::new()
        .merge(auth_routes)
        .merge(listing_routes)
        .merge(ticket_routes)
        .merge(admin_routes)
        .merge(public_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<R>,
        ))
        .with_state(state)
        .layer(axum::Extension(cookie_config))
}

fn session_cookie(config: &CookieConfig, token: &str) -> Cookie<'static> {
    let same_site = match config.same_site {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::None => SameSite::None,
    };

    Cookie::build((config.name.clone(), token.to_string()))
        .path(config.path.clone())
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(same_site)
        .build()
}

async fn health_handler<R>(State(state): State<AuthState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .hearth
        .health_check()
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn register_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    // Admin accounts are never self-service
    let role = match payload.role {
        Some(UserRole::Admin) | None => UserRole::Buyer,
        Some(role) => role,
    };

    let user = state
        .hearth
        .register_user_with_password(&payload.email, &payload.password, payload.name, role)
        .await?;

    // Create a session for the newly registered user (auto-login)
    let session = state
        .hearth
        .create_session(&user.id, connection_info.user_agent, connection_info.ip)
        .await?;

    let cookie = session_cookie(&cookie_config, session.token.as_str());

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AuthResponse { user, session }),
    ))
}

async fn login_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let (user, session) = state
        .hearth
        .login_user_with_password(
            &payload.email,
            &payload.password,
            connection_info.user_agent,
            connection_info.ip,
        )
        .await?;

    let cookie = session_cookie(&cookie_config, session.token.as_str());

    Ok((
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AuthResponse { user, session }),
    ))
}

async fn logout_handler<R>(
    State(state): State<AuthState<R>>,
    jar: CookieJar,
    SessionTokenFromRequest(session_token): SessionTokenFromRequest,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    if let Some(session_token) = session_token {
        let _ = state.hearth.delete_session(&session_token).await;
    }

    let jar = jar.remove(Cookie::from("session_id"));

    Ok((
        jar,
        Json(MessageResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

async fn get_session_handler<R>(
    State(state): State<AuthState<R>>,
    SessionTokenFromRequest(session_token): SessionTokenFromRequest,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let session_token = session_token.ok_or(ApiError::Unauthorized)?;

    let session = state
        .hearth
        .get_session(&session_token)
        .await
        .map_err(|_| ApiError::SessionNotFound)?;

    Ok(Json(SessionResponse { session }))
}

async fn get_user_handler(OptionalAuthUser(user): OptionalAuthUser) -> Result<impl IntoResponse> {
    match user {
        Some(user) => Ok(Json(UserResponse { user }).into_response()),
        None => Err(ApiError::Unauthorized),
    }
}

async fn change_password_handler<R>(
    State(state): State<AuthState<R>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .hearth
        .change_user_password(&user.id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed, please log in again".to_string(),
    }))
}

async fn search_listings_handler<R>(
    State(state): State<AuthState<R>>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let filter = PropertyFilter {
        status: query
            .status
            .as_deref()
            .map(PropertyStatus::parse)
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        type_key: query.type_key.clone(),
        listing: query
            .listing
            .as_deref()
            .map(hearth::ListingKind::parse)
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        city: query.city.clone(),
        owner_id: None,
        min_price_cents: query.min_price_cents,
        max_price_cents: query.max_price_cents,
    };

    let page = state
        .hearth
        .properties()
        .search(&filter, query.page_request())
        .await?;

    Ok(Json(ListingPageResponse::from(page)))
}

async fn create_listing_handler<R>(
    State(state): State<AuthState<R>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateListingRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let input = ListingInput {
        title: payload.title,
        description: payload.description,
        type_key: payload.type_key,
        listing: payload.listing,
        price_cents: payload.price_cents,
        currency: payload.currency,
        city: payload.city,
        address: payload.address,
        attributes: payload.attributes,
    };

    let property = state
        .hearth
        .properties()
        .create_listing(&user.id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(ListingResponse { property })))
}

async fn get_listing_handler<R>(
    State(state): State<AuthState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let property = state
        .hearth
        .properties()
        .get_listing(&PropertyId::new(&id))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(ListingResponse { property }))
}

async fn update_listing_handler<R>(
    State(state): State<AuthState<R>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let id = PropertyId::new(&id);
    let existing = state
        .hearth
        .properties()
        .get_listing(&id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if existing.owner_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    let input = ListingInput {
        title: payload.title,
        description: payload.description,
        type_key: payload.type_key,
        listing: payload.listing,
        price_cents: payload.price_cents,
        currency: payload.currency,
        city: payload.city,
        address: payload.address,
        attributes: payload.attributes,
    };

    let property = state.hearth.properties().update_listing(&id, input).await?;

    Ok(Json(ListingResponse { property }))
}

async fn delete_listing_handler<R>(
    State(state): State<AuthState<R>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let id = PropertyId::new(&id);
    let existing = state
        .hearth
        .properties()
        .get_listing(&id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if existing.owner_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    state.hearth.properties().delete_listing(&id).await?;

    Ok(Json(MessageResponse {
        message: "Listing deleted".to_string(),
    }))
}

async fn list_property_types_handler<R>(
    State(state): State<AuthState<R>>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let types = state.hearth.properties().list_types().await?;
    Ok(Json(types))
}

async fn set_listing_status_handler<R>(
    State(state): State<AuthState<R>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(status): Json<PropertyStatus>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let id = PropertyId::new(&id);
    state
        .hearth
        .properties()
        .get_listing(&id)
        .await?
        .ok_or(ApiError::NotFound)?;

    state.hearth.properties().set_status(&id, status).await?;

    Ok(Json(MessageResponse {
        message: "Listing status updated".to_string(),
    }))
}

async fn open_ticket_handler<R>(
    State(state): State<AuthState<R>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<OpenTicketRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let ticket = state
        .hearth
        .support()
        .open_ticket(
            &user.id,
            &payload.subject,
            &payload.body,
            payload.priority.unwrap_or(TicketPriority::Normal),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TicketResponse { ticket })))
}

async fn list_my_tickets_handler<R>(
    State(state): State<AuthState<R>>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let page = state
        .hearth
        .support()
        .list_for_user(&user.id, query.page_request())
        .await?;

    Ok(Json(TicketPageResponse::from(page)))
}

async fn get_ticket_handler<R>(
    State(state): State<AuthState<R>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let thread = state
        .hearth
        .support()
        .get_thread(&TicketId::new(&id))
        .await?
        .ok_or(ApiError::NotFound)?;

    if thread.ticket.user_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(TicketThreadResponse {
        ticket: thread.ticket,
        replies: thread.replies,
    }))
}

async fn reply_ticket_handler<R>(
    State(state): State<AuthState<R>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<TicketReplyRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let id = TicketId::new(&id);
    let thread = state
        .hearth
        .support()
        .get_thread(&id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let staff = user.is_admin();
    if thread.ticket.user_id != user.id && !staff {
        return Err(ApiError::Forbidden);
    }

    let reply = state
        .hearth
        .support()
        .reply(&id, &user.id, staff, &payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(reply)))
}

async fn list_all_tickets_handler<R>(
    State(state): State<AuthState<R>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let page = state.hearth.support().list(query.page_request()).await?;

    Ok(Json(TicketPageResponse::from(page)))
}

async fn set_ticket_status_handler<R>(
    State(state): State<AuthState<R>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(status): Json<TicketStatus>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .hearth
        .support()
        .set_status(&TicketId::new(&id), status)
        .await?;

    Ok(Json(MessageResponse {
        message: "Ticket status updated".to_string(),
    }))
}

async fn get_settings_handler<R>(
    State(state): State<AuthState<R>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let settings = state.hearth.settings().get().await?;
    Ok(Json(SettingsResponse { settings }))
}

async fn update_settings_handler<R>(
    State(state): State<AuthState<R>>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<Settings>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let settings = state.hearth.settings().update(&payload).await?;
    Ok(Json(SettingsResponse { settings }))
}

async fn get_hero_handler<R>(State(state): State<AuthState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let hero = state.hearth.settings().get_hero().await?;
    Ok(Json(HeroResponse { hero }))
}

async fn update_hero_handler<R>(
    State(state): State<AuthState<R>>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<HeroSettings>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let hero = state.hearth.settings().update_hero(&payload).await?;
    Ok(Json(HeroResponse { hero }))
}
