//! Library, membership and copy endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_info::AddCopyRequest,
        library::{CreateLibrary, LibraryDetails, LibrarySummary, UpdateLibrary},
        user::UserSummary,
    },
    AppState,
};

use super::CurrentUser;

/// List libraries
#[utoipa::path(
    get,
    path = "/libraries",
    tag = "libraries",
    responses(
        (status = 200, description = "List of libraries", body = Vec<LibrarySummary>)
    )
)]
pub async fn list_libraries(State(state): State<AppState>) -> AppResult<Json<Vec<LibrarySummary>>> {
    let libraries = state.services.libraries.list().await?;
    Ok(Json(libraries))
}

/// Create a library owned by the current user
#[utoipa::path(
    post,
    path = "/libraries",
    tag = "libraries",
    security(("session_cookie" = [])),
    request_body = CreateLibrary,
    responses(
        (status = 201, description = "Library created", body = LibraryDetails),
        (status = 400, description = "Invalid name or location", body = crate::error::ErrorResponse),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_library(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateLibrary>,
) -> AppResult<(StatusCode, Json<LibraryDetails>)> {
    let library = state.services.libraries.create(request, &user).await?;
    Ok((StatusCode::CREATED, Json(library)))
}

/// Get a library with owner, members and copies
#[utoipa::path(
    get,
    path = "/libraries/{id}",
    tag = "libraries",
    params(
        ("id" = Uuid, Path, description = "Library ID")
    ),
    responses(
        (status = 200, description = "Library details", body = LibraryDetails),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_library(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LibraryDetails>> {
    let library = state.services.libraries.get_details(id).await?;
    Ok(Json(library))
}

/// Rename or move a library
#[utoipa::path(
    patch,
    path = "/libraries/{id}",
    tag = "libraries",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Library ID")
    ),
    request_body = UpdateLibrary,
    responses(
        (status = 200, description = "Library updated", body = LibraryDetails),
        (status = 400, description = "Invalid name or location", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_library(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLibrary>,
) -> AppResult<Json<LibraryDetails>> {
    let library = state.services.libraries.update(id, request, &user).await?;
    Ok(Json(library))
}

/// Delete a library with its memberships and copies
#[utoipa::path(
    delete,
    path = "/libraries/{id}",
    tag = "libraries",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Library ID")
    ),
    responses(
        (status = 204, description = "Library deleted"),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_library(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.libraries.delete(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List library members
#[utoipa::path(
    get,
    path = "/libraries/{id}/members",
    tag = "libraries",
    params(
        ("id" = Uuid, Path, description = "Library ID")
    ),
    responses(
        (status = 200, description = "Members", body = Vec<UserSummary>),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<UserSummary>>> {
    let members = state.services.libraries.members(id).await?;
    Ok(Json(members))
}

/// Join a library
#[utoipa::path(
    post,
    path = "/libraries/{id}/members",
    tag = "libraries",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Library ID")
    ),
    responses(
        (status = 201, description = "Joined", body = LibraryDetails),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already a member", body = crate::error::ErrorResponse)
    )
)]
pub async fn join_library(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<LibraryDetails>)> {
    let library = state.services.libraries.join(id, &user).await?;
    Ok((StatusCode::CREATED, Json(library)))
}

/// Leave a library
#[utoipa::path(
    delete,
    path = "/libraries/{id}/members",
    tag = "libraries",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Library ID")
    ),
    responses(
        (status = 204, description = "Left"),
        (status = 403, description = "Not a member, or the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn leave_library(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.libraries.leave(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a copy of a catalog book
#[utoipa::path(
    post,
    path = "/libraries/{id}/copies",
    tag = "libraries",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Library ID")
    ),
    request_body = AddCopyRequest,
    responses(
        (status = 201, description = "Copy added", body = LibraryDetails),
        (status = 400, description = "Malformed catalog id", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Library or catalog book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_copy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AddCopyRequest>,
) -> AppResult<(StatusCode, Json<LibraryDetails>)> {
    let library = state.services.libraries.add_copy(id, request, &user).await?;
    Ok((StatusCode::CREATED, Json(library)))
}

/// Remove a copy from a library
#[utoipa::path(
    delete,
    path = "/libraries/{id}/copies/{copy_id}",
    tag = "libraries",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Library ID"),
        ("copy_id" = Uuid, Path, description = "Book copy ID")
    ),
    responses(
        (status = 204, description = "Copy removed"),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Library or copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_copy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, copy_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state.services.libraries.remove_copy(id, copy_id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
