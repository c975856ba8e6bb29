//! Library model: a named collection of copies with one owner and a member set

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{book_copy::BookCopyDetails, user::UserSummary};
use crate::error::{AppError, AppResult};

static LIBRARY_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9 _-]+$").unwrap());

/// Full library row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Library {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Owner-only operations go through this check
    pub fn ensure_owner(&self, user_id: Uuid) -> AppResult<()> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You are not the owner of this library".to_string(),
            ))
        }
    }
}

/// Geocoded position of a library
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> AppResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::Validation(format!(
                "Coordinates out of range: {}, {}",
                latitude, longitude
            )));
        }
        Ok(Self { latitude, longitude })
    }
}

/// Library list entry, with counts instead of embedded relations
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySummary {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub owner_id: Uuid,
    pub member_count: i64,
    pub copy_count: i64,
}

/// Library with owner, members and copies embedded one level deep
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDetails {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub owner: UserSummary,
    pub members: Vec<UserSummary>,
    pub copies: Vec<BookCopyDetails>,
}

impl LibraryDetails {
    pub fn assemble(
        library: Library,
        members: Vec<UserSummary>,
        copies: Vec<BookCopyDetails>,
    ) -> AppResult<Self> {
        let owner = members
            .iter()
            .find(|member| member.id == library.owner_id)
            .cloned()
            .ok_or_else(|| {
                AppError::Internal(format!("Owner of library {} is not a member", library.id))
            })?;

        Ok(LibraryDetails {
            id: library.id,
            name: library.name,
            location: library.location,
            latitude: library.latitude,
            longitude: library.longitude,
            created_at: library.created_at,
            owner,
            members,
            copies,
        })
    }
}

/// Create library request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLibrary {
    #[validate(
        length(min = 5, max = 40, message = "Name must be 5 to 40 characters"),
        regex(
            path = *LIBRARY_NAME_RE,
            message = "Name may only contain letters, digits, spaces, dashes and underscores"
        )
    )]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "Location is required"))]
    pub location: String,
}

/// Update library request (owner only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLibrary {
    #[validate(
        length(min = 5, max = 40, message = "Name must be 5 to 40 characters"),
        regex(
            path = *LIBRARY_NAME_RE,
            message = "Name may only contain letters, digits, spaces, dashes and underscores"
        )
    )]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Location cannot be empty"))]
    pub location: Option<String>,
}

impl CreateLibrary {
    /// Trim surrounding whitespace; validation runs on the stored form
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            location: self.location.trim().to_string(),
        }
    }
}

impl UpdateLibrary {
    /// Trim surrounding whitespace; validation runs on the stored form
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            location: self.location.map(|location| location.trim().to_string()),
        }
    }
}
