//! User directory service

use crate::{
    error::{AppError, AppResult},
    models::user::{RegisterUser, User, UserDetails, UserSummary},
    repository::Repository,
};

use super::accounts::AccountsService;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    accounts: AccountsService,
}

impl UsersService {
    pub fn new(repository: Repository, accounts: AccountsService) -> Self {
        Self { repository, accounts }
    }

    /// List all users
    pub async fn list(&self) -> AppResult<Vec<UserSummary>> {
        self.repository.users.list().await
    }

    /// Full profile of a user: memberships, owned libraries and current loans
    pub async fn get_details(&self, username: &str) -> AppResult<UserDetails> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

        let memberships = self.repository.libraries.list_for_member(user.id).await?;
        let loans = self.repository.book_copies.list_loans(user.id).await?;

        Ok(UserDetails::assemble(user, memberships, loans))
    }

    /// Create a user; same rules as account registration
    pub async fn create(&self, request: RegisterUser) -> AppResult<User> {
        self.accounts.register(request).await
    }
}
