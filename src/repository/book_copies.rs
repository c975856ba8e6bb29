//! Book copies repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_copy::{BookCopy, BookCopyDetails, BookCopyRow, CopyStatus, CopyTransition},
};

const DETAILS_SELECT: &str = r#"
    SELECT c.id, c.library_id, c.status, c.due_date, c.created_at,
           b.id AS book_info_id, b.open_library_id, b.title, b.authors, b.image_url,
           c.borrower_id, u.username AS borrower_username
    FROM book_copies c
    JOIN book_infos b ON b.id = c.book_info_id
    LEFT JOIN users u ON u.id = c.borrower_id
"#;

#[derive(Clone)]
pub struct BookCopiesRepository {
    pool: Pool<Postgres>,
}

impl BookCopiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get copy by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookCopy> {
        sqlx::query_as::<_, BookCopy>("SELECT * FROM book_copies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book copy not found".to_string()))
    }

    /// Get copy by ID with book info and borrower
    pub async fn get_details(&self, id: Uuid) -> AppResult<BookCopyDetails> {
        sqlx::query_as::<_, BookCopyRow>(&format!("{} WHERE c.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(BookCopyDetails::from)
            .ok_or_else(|| AppError::NotFound("Book copy not found".to_string()))
    }

    pub async fn list_for_library(&self, library_id: Uuid) -> AppResult<Vec<BookCopyDetails>> {
        let rows = sqlx::query_as::<_, BookCopyRow>(&format!(
            "{} WHERE c.library_id = $1 ORDER BY b.title, c.created_at",
            DETAILS_SELECT
        ))
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(BookCopyDetails::from).collect())
    }

    /// Copies currently borrowed by a user
    pub async fn list_loans(&self, user_id: Uuid) -> AppResult<Vec<BookCopyDetails>> {
        let rows = sqlx::query_as::<_, BookCopyRow>(&format!(
            "{} WHERE c.borrower_id = $1 AND c.status = 'borrowed' ORDER BY c.due_date",
            DETAILS_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(BookCopyDetails::from).collect())
    }

    /// Create an available copy of `book_info_id` in `library_id`
    pub async fn create(&self, library_id: Uuid, book_info_id: Uuid) -> AppResult<BookCopy> {
        let copy = sqlx::query_as::<_, BookCopy>(
            r#"
            INSERT INTO book_copies (id, book_info_id, library_id, status, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book_info_id)
        .bind(library_id)
        .bind(CopyStatus::Available)
        .fetch_one(&self.pool)
        .await?;
        Ok(copy)
    }

    /// Delete a copy if it belongs to `library_id`. Returns false otherwise.
    pub async fn delete_from_library(&self, library_id: Uuid, copy_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM book_copies WHERE id = $1 AND library_id = $2")
            .bind(copy_id)
            .bind(library_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Apply a planned transition with compare-and-swap semantics: the
    /// update only happens if status and borrower still hold the values the
    /// plan was computed from. Returns `None` when the row moved on.
    pub async fn apply_transition(
        &self,
        copy_id: Uuid,
        transition: &CopyTransition,
    ) -> AppResult<Option<BookCopy>> {
        let copy = sqlx::query_as::<_, BookCopy>(
            r#"
            UPDATE book_copies
            SET status = $2, borrower_id = $3, due_date = $4
            WHERE id = $1
              AND status = $5
              AND borrower_id IS NOT DISTINCT FROM $6
            RETURNING *
            "#,
        )
        .bind(copy_id)
        .bind(transition.status)
        .bind(transition.borrower_id)
        .bind(transition.due_date)
        .bind(transition.expected_status)
        .bind(transition.expected_borrower)
        .fetch_optional(&self.pool)
        .await?;
        Ok(copy)
    }
}
