//! Book info repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book_info::{BookInfo, NewBookInfo},
};

#[derive(Clone)]
pub struct BookInfosRepository {
    pool: Pool<Postgres>,
}

impl BookInfosRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn find_by_open_library_id(&self, open_library_id: &str) -> AppResult<Option<BookInfo>> {
        let info = sqlx::query_as::<_, BookInfo>("SELECT * FROM book_infos WHERE open_library_id = $1")
            .bind(open_library_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(info)
    }

    /// Insert, or return the existing row when another request created the
    /// same catalog id first.
    pub async fn upsert(&self, info: &NewBookInfo) -> AppResult<BookInfo> {
        let info = sqlx::query_as::<_, BookInfo>(
            r#"
            INSERT INTO book_infos (id, open_library_id, title, authors, image_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (open_library_id)
                DO UPDATE SET open_library_id = EXCLUDED.open_library_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&info.open_library_id)
        .bind(&info.title)
        .bind(&info.authors)
        .bind(&info.image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(info)
    }
}
