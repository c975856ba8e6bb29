//! Catalog search endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::book_info::CatalogSearchResult,
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-text query
    pub q: Option<String>,
}

/// Search the external catalog
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(SearchQuery),
    responses(
        (status = 200, description = "Catalog matches", body = Vec<CatalogSearchResult>),
        (status = 400, description = "Missing query", body = crate::error::ErrorResponse),
        (status = 404, description = "No results", body = crate::error::ErrorResponse),
        (status = 502, description = "Catalog unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<CatalogSearchResult>>> {
    let q = query
        .q
        .ok_or_else(|| AppError::Validation("Missing query".to_string()))?;

    let results = state.services.catalog.search(&q).await?;
    Ok(Json(results))
}
