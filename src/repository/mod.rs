//! Repository layer for database operations

pub mod book_copies;
pub mod book_infos;
pub mod libraries;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub libraries: libraries::LibrariesRepository,
    pub book_infos: book_infos::BookInfosRepository,
    pub book_copies: book_copies::BookCopiesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            libraries: libraries::LibrariesRepository::new(pool.clone()),
            book_infos: book_infos::BookInfosRepository::new(pool.clone()),
            book_copies: book_copies::BookCopiesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
