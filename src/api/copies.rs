//! Book copy endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book_copy::{BookCopyDetails, CopyAction, UpdateCopyRequest},
    AppState,
};

use super::CurrentUser;

/// Get a book copy
#[utoipa::path(
    get,
    path = "/copies/{id}",
    tag = "copies",
    params(
        ("id" = Uuid, Path, description = "Book copy ID")
    ),
    responses(
        (status = 200, description = "Book copy", body = BookCopyDetails),
        (status = 404, description = "Book copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_copy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookCopyDetails>> {
    let copy = state.services.copies.get_details(id).await?;
    Ok(Json(copy))
}

/// Borrow, return, extend or lose a book copy
#[utoipa::path(
    patch,
    path = "/copies/{id}",
    tag = "copies",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Book copy ID")
    ),
    request_body = UpdateCopyRequest,
    responses(
        (status = 200, description = "Book copy updated", body = BookCopyDetails),
        (status = 400, description = "Invalid action", body = crate::error::ErrorResponse),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse),
        (status = 403, description = "Action not allowed in the copy's current state", body = crate::error::ErrorResponse),
        (status = 404, description = "Book copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book copy changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_copy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCopyRequest>,
) -> AppResult<Json<BookCopyDetails>> {
    let action: CopyAction = request.action.parse()?;
    let copy = state.services.copies.update(id, action, &user).await?;
    Ok(Json(copy))
}
