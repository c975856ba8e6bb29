//! API handlers for Libshare REST endpoints

pub mod accounts;
pub mod books;
pub mod copies;
pub mod health;
pub mod libraries;
pub mod openapi;
pub mod users;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::{error::AppError, models::user::User, AppState};

/// Session id read from the session cookie
pub struct SessionId(pub String);

#[async_trait]
impl FromRequestParts<AppState> for SessionId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        jar.get(&state.config.sessions.cookie_name)
            .map(|cookie| SessionId(cookie.value().to_string()))
            .ok_or_else(|| AppError::Authentication("Not logged in".to_string()))
    }
}

/// Extractor for the user behind the session cookie
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let SessionId(session_id) = SessionId::from_request_parts(parts, state).await?;
        let user = state.services.accounts.session_user(&session_id).await?;
        Ok(CurrentUser(user))
    }
}
