//! Book copy loans: borrow, return, extend, lose

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{
        book_copy::{BookCopyDetails, CopyAction, CopyActor, LoanPolicy},
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CopiesService {
    repository: Repository,
    policy: LoanPolicy,
}

impl CopiesService {
    pub fn new(repository: Repository, loans: &LoansConfig) -> Self {
        Self {
            repository,
            policy: LoanPolicy::from(loans),
        }
    }

    pub async fn get_details(&self, id: Uuid) -> AppResult<BookCopyDetails> {
        self.repository.book_copies.get_details(id).await
    }

    /// Apply `action` to a copy on behalf of `user`
    pub async fn update(&self, id: Uuid, action: CopyAction, user: &User) -> AppResult<BookCopyDetails> {
        let copy = self.repository.book_copies.get_by_id(id).await?;
        let library = self.repository.libraries.get_by_id(copy.library_id).await?;

        let actor = CopyActor {
            user_id: user.id,
            is_member: self.repository.libraries.is_member(library.id, user.id).await?,
            is_owner: library.is_owned_by(user.id),
        };
        let transition = copy.plan(action, actor, self.policy, Utc::now())?;

        let updated = self
            .repository
            .book_copies
            .apply_transition(copy.id, &transition)
            .await?
            .ok_or_else(|| {
                tracing::warn!(copy_id = %copy.id, ?action, "Concurrent book copy update");
                AppError::Conflict("Book copy was modified concurrently".to_string())
            })?;

        tracing::info!(
            copy_id = %updated.id,
            user_id = %user.id,
            ?action,
            status = %updated.status,
            "Book copy updated"
        );
        self.repository.book_copies.get_details(updated.id).await
    }
}
