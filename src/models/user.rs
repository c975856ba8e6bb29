//! User model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{book_copy::BookCopyDetails, library::LibrarySummary};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

/// Full user row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2 PHC string)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Minimal user reference embedded in other resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// User with memberships, owned libraries and active loans
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub memberships: Vec<LibrarySummary>,
    pub owned_libraries: Vec<LibrarySummary>,
    pub loans: Vec<BookCopyDetails>,
}

impl UserDetails {
    /// Owned libraries are taken from the membership list, since owners are
    /// always members.
    pub fn assemble(user: User, memberships: Vec<LibrarySummary>, loans: Vec<BookCopyDetails>) -> Self {
        let owned_libraries = memberships
            .iter()
            .filter(|library| library.owner_id == user.id)
            .cloned()
            .collect();

        UserDetails {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            memberships,
            owned_libraries,
            loans,
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(
        length(min = 3, max = 24, message = "Username must be 3 to 24 characters"),
        regex(
            path = *USERNAME_RE,
            message = "Username may only contain letters, digits, dashes and underscores"
        )
    )]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}
