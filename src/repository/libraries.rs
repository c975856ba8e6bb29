//! Libraries and memberships repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        library::{GeoPoint, Library, LibrarySummary},
        user::UserSummary,
    },
};

const SUMMARY_SELECT: &str = r#"
    SELECT l.id, l.name, l.location, l.latitude, l.longitude, l.owner_id,
           (SELECT COUNT(*) FROM library_members m WHERE m.library_id = l.id) AS member_count,
           (SELECT COUNT(*) FROM book_copies c WHERE c.library_id = l.id) AS copy_count
    FROM libraries l
"#;

#[derive(Clone)]
pub struct LibrariesRepository {
    pool: Pool<Postgres>,
}

impl LibrariesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get library by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Library> {
        sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Library not found".to_string()))
    }

    /// List all libraries
    pub async fn list(&self) -> AppResult<Vec<LibrarySummary>> {
        let libraries = sqlx::query_as::<_, LibrarySummary>(&format!(
            "{} ORDER BY l.created_at",
            SUMMARY_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(libraries)
    }

    /// Libraries a user is a member of (owned ones included)
    pub async fn list_for_member(&self, user_id: Uuid) -> AppResult<Vec<LibrarySummary>> {
        let libraries = sqlx::query_as::<_, LibrarySummary>(&format!(
            r#"{}
            JOIN library_members lm ON lm.library_id = l.id
            WHERE lm.user_id = $1
            ORDER BY lm.joined_at"#,
            SUMMARY_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(libraries)
    }

    /// Create a library and subscribe its owner in one transaction
    pub async fn create(
        &self,
        name: &str,
        location: &str,
        point: GeoPoint,
        owner_id: Uuid,
    ) -> AppResult<Library> {
        let mut tx = self.pool.begin().await?;

        let library = sqlx::query_as::<_, Library>(
            r#"
            INSERT INTO libraries (id, name, location, latitude, longitude, owner_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(location)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO library_members (library_id, user_id, joined_at) VALUES ($1, $2, NOW())")
            .bind(library.id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(library)
    }

    /// Update name and/or location. `None` keeps the current value.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        location: Option<(&str, GeoPoint)>,
    ) -> AppResult<Library> {
        let (location, latitude, longitude) = match location {
            Some((text, point)) => (Some(text), Some(point.latitude), Some(point.longitude)),
            None => (None, None, None),
        };

        sqlx::query_as::<_, Library>(
            r#"
            UPDATE libraries SET
                name = COALESCE($2, name),
                location = COALESCE($3, location),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(location)
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Library not found".to_string()))
    }

    /// Delete a library; memberships and copies cascade
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM libraries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Library not found".to_string()));
        }
        Ok(())
    }

    /// Members of a library, in join order
    pub async fn members(&self, library_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let members = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username
            FROM library_members lm
            JOIN users u ON u.id = lm.user_id
            WHERE lm.library_id = $1
            ORDER BY lm.joined_at, u.username
            "#,
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    pub async fn is_member(&self, library_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM library_members WHERE library_id = $1 AND user_id = $2)",
        )
        .bind(library_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Add a membership. Returns false if the user already was a member.
    pub async fn add_member(&self, library_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO library_members (library_id, user_id, joined_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (library_id, user_id) DO NOTHING
            "#,
        )
        .bind(library_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Remove a membership. Returns false if the user was not a member.
    pub async fn remove_member(&self, library_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM library_members WHERE library_id = $1 AND user_id = $2")
            .bind(library_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
