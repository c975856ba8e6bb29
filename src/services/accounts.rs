//! Registration, login and password handling

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginRequest, RegisterUser, User},
    repository::Repository,
};

use super::sessions::SessionStore;

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    sessions: SessionStore,
}

impl AccountsService {
    pub fn new(repository: Repository, sessions: SessionStore) -> Self {
        Self { repository, sessions }
    }

    /// Register a new account. Duplicate usernames or emails are conflicts.
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;

        if self
            .repository
            .users
            .get_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .create(&request.username, &request.email, &password_hash)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and open a session. Returns the session id and user.
    pub async fn login(&self, request: LoginRequest) -> AppResult<(String, User)> {
        request.validate()?;

        let user = self
            .repository
            .users
            .get_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user.password_hash, &request.password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let session_id = self.sessions.create(user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((session_id, user))
    }

    /// Close a session
    pub async fn logout(&self, session_id: &str) -> AppResult<()> {
        if !self.sessions.destroy(session_id).await? {
            return Err(AppError::Authentication("No active session".to_string()));
        }
        Ok(())
    }

    /// Resolve the user behind a session id
    pub async fn session_user(&self, session_id: &str) -> AppResult<User> {
        let user_id = self
            .sessions
            .resolve(session_id)
            .await?
            .ok_or_else(|| AppError::Authentication("Session expired or invalid".to_string()))?;

        match self.repository.users.get_by_id(user_id).await {
            Ok(user) => Ok(user),
            Err(AppError::NotFound(_)) => {
                Err(AppError::Authentication("Session user no longer exists".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub fn session_ttl_seconds(&self) -> u64 {
        self.sessions.ttl_seconds()
    }
}

/// Hash a password with argon2 and a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(stored_hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
