//! Book copy model and the lending state machine
//!
//! A copy moves `available -> borrowed -> available`, and either
//! `available` or `borrowed` can move to `lost`, which is terminal.
//! Transitions are planned here without touching storage; the repository
//! applies a plan only if the row still matches the state it was planned
//! from.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{book_info::BookInfo, user::UserSummary};
use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
};

/// Lending status of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    Available,
    Borrowed,
    Lost,
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Available => "available",
            CopyStatus::Borrowed => "borrowed",
            CopyStatus::Lost => "lost",
        }
    }
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CopyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(CopyStatus::Available),
            "borrowed" => Ok(CopyStatus::Borrowed),
            "lost" => Ok(CopyStatus::Lost),
            _ => Err(format!("Invalid copy status: {}", s)),
        }
    }
}

// SQLx conversion for CopyStatus (stored as TEXT)
impl sqlx::Type<Postgres> for CopyStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for CopyStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for CopyStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Action requested on a copy through `PATCH /copies/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CopyAction {
    Borrow,
    Return,
    Extend,
    Lose,
}

impl std::str::FromStr for CopyAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrow" => Ok(CopyAction::Borrow),
            "return" => Ok(CopyAction::Return),
            "extend" => Ok(CopyAction::Extend),
            "lose" => Ok(CopyAction::Lose),
            _ => Err(AppError::Validation("Invalid action".to_string())),
        }
    }
}

/// Full book copy row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookCopy {
    pub id: Uuid,
    pub book_info_id: Uuid,
    pub library_id: Uuid,
    pub status: CopyStatus,
    pub borrower_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Who is acting on a copy, relative to the copy's library
#[derive(Debug, Clone, Copy)]
pub struct CopyActor {
    pub user_id: Uuid,
    pub is_member: bool,
    pub is_owner: bool,
}

/// Loan periods applied on borrow and extend
#[derive(Debug, Clone, Copy)]
pub struct LoanPolicy {
    pub duration: Duration,
    pub extension: Duration,
}

impl From<&LoansConfig> for LoanPolicy {
    fn from(config: &LoansConfig) -> Self {
        LoanPolicy {
            duration: Duration::days(config.duration_days),
            extension: Duration::days(config.extension_days),
        }
    }
}

/// A planned state change. `expected_*` hold the state the plan was
/// computed from and act as the compare-and-swap guard.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyTransition {
    pub expected_status: CopyStatus,
    pub expected_borrower: Option<Uuid>,
    pub status: CopyStatus,
    pub borrower_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

impl BookCopy {
    pub fn is_borrowed_by(&self, user_id: Uuid) -> bool {
        self.status == CopyStatus::Borrowed && self.borrower_id == Some(user_id)
    }

    /// Plan `action` on this copy for `actor`
    pub fn plan(
        &self,
        action: CopyAction,
        actor: CopyActor,
        policy: LoanPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<CopyTransition> {
        let guarded = |status, borrower_id, due_date| CopyTransition {
            expected_status: self.status,
            expected_borrower: self.borrower_id,
            status,
            borrower_id,
            due_date,
        };

        match action {
            CopyAction::Borrow => {
                if !actor.is_member {
                    return Err(AppError::NotAMember);
                }
                if self.status != CopyStatus::Available {
                    return Err(AppError::NotAvailable(format!(
                        "Book copy is {}",
                        self.status
                    )));
                }
                Ok(guarded(
                    CopyStatus::Borrowed,
                    Some(actor.user_id),
                    Some(now + policy.duration),
                ))
            }
            CopyAction::Return => {
                if !self.is_borrowed_by(actor.user_id) {
                    return Err(AppError::NotBorrowed(
                        "Book copy is not borrowed by this user".to_string(),
                    ));
                }
                Ok(guarded(CopyStatus::Available, None, None))
            }
            CopyAction::Extend => {
                if !self.is_borrowed_by(actor.user_id) {
                    return Err(AppError::NotBorrowed(
                        "Book copy is not borrowed by this user".to_string(),
                    ));
                }
                let due = self.due_date.unwrap_or(now);
                Ok(guarded(
                    CopyStatus::Borrowed,
                    self.borrower_id,
                    Some(due + policy.extension),
                ))
            }
            CopyAction::Lose => {
                if self.status == CopyStatus::Lost {
                    return Err(AppError::NotAvailable("Book copy is already lost".to_string()));
                }
                if !actor.is_owner && !self.is_borrowed_by(actor.user_id) {
                    return Err(AppError::Forbidden(
                        "Only the library owner or the borrower can report a copy as lost"
                            .to_string(),
                    ));
                }
                Ok(guarded(CopyStatus::Lost, None, None))
            }
        }
    }
}

/// Flat row of a copy joined with its book info and borrower
#[derive(Debug, Clone, FromRow)]
pub struct BookCopyRow {
    pub id: Uuid,
    pub library_id: Uuid,
    pub status: CopyStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub book_info_id: Uuid,
    pub open_library_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub image_url: Option<String>,
    pub borrower_id: Option<Uuid>,
    pub borrower_username: Option<String>,
}

/// Copy with its book info and borrower embedded
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookCopyDetails {
    pub id: Uuid,
    pub library_id: Uuid,
    pub status: CopyStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub book_info: BookInfo,
    pub borrower: Option<UserSummary>,
}

impl From<BookCopyRow> for BookCopyDetails {
    fn from(row: BookCopyRow) -> Self {
        let borrower = match (row.borrower_id, row.borrower_username) {
            (Some(id), Some(username)) => Some(UserSummary { id, username }),
            _ => None,
        };

        BookCopyDetails {
            id: row.id,
            library_id: row.library_id,
            status: row.status,
            due_date: row.due_date,
            created_at: row.created_at,
            book_info: BookInfo {
                id: row.book_info_id,
                open_library_id: row.open_library_id,
                title: row.title,
                authors: row.authors,
                image_url: row.image_url,
            },
            borrower,
        }
    }
}

/// Update copy request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCopyRequest {
    /// One of `borrow`, `return`, `extend`, `lose`
    pub action: String,
}
