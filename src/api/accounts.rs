//! Account endpoints: registration and cookie sessions

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    config::SessionsConfig,
    error::AppResult,
    models::user::{LoginRequest, RegisterUser, User},
    AppState,
};

use super::{CurrentUser, SessionId};

fn session_cookie(config: &SessionsConfig, session_id: String, ttl_seconds: u64) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .max_age(time::Duration::seconds(ttl_seconds as i64))
        .build()
}

/// Get the logged-in user
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "accounts",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    )
)]
pub async fn current_account(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/accounts",
    tag = "accounts",
    request_body = RegisterUser,
    responses(
        (status = 200, description = "Account created", body = User),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email already taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterUser>,
) -> AppResult<Json<User>> {
    let user = state.services.accounts.register(request).await?;
    Ok(Json(user))
}

/// Log in and receive a session cookie
#[utoipa::path(
    post,
    path = "/accounts/session",
    tag = "accounts",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = User),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<User>)> {
    let accounts = &state.services.accounts;
    let (session_id, user) = accounts.login(request).await?;

    let cookie = session_cookie(&state.config.sessions, session_id, accounts.session_ttl_seconds());
    Ok((jar.add(cookie), Json(user)))
}

/// Log out and clear the session cookie
#[utoipa::path(
    delete,
    path = "/accounts/session",
    tag = "accounts",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    jar: CookieJar,
) -> AppResult<CookieJar> {
    state.services.accounts.logout(&session_id).await?;

    let removal = Cookie::build((state.config.sessions.cookie_name.clone(), "")).path("/");
    Ok(jar.remove(removal))
}
