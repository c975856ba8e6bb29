//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, books, copies, health, libraries, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libshare API",
        version = "1.0.0",
        description = "Neighbourhood library sharing REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Accounts
        accounts::current_account,
        accounts::register,
        accounts::login,
        accounts::logout,
        // Users
        users::list_users,
        users::create_user,
        users::get_user,
        // Libraries
        libraries::list_libraries,
        libraries::create_library,
        libraries::get_library,
        libraries::update_library,
        libraries::delete_library,
        libraries::list_members,
        libraries::join_library,
        libraries::leave_library,
        libraries::add_copy,
        libraries::remove_copy,
        // Copies
        copies::get_copy,
        copies::update_copy,
        // Books
        books::search_books,
    ),
    components(
        schemas(
            // Users
            crate::models::user::User,
            crate::models::user::UserSummary,
            crate::models::user::UserDetails,
            crate::models::user::RegisterUser,
            crate::models::user::LoginRequest,
            // Libraries
            crate::models::library::LibrarySummary,
            crate::models::library::LibraryDetails,
            crate::models::library::CreateLibrary,
            crate::models::library::UpdateLibrary,
            // Books and copies
            crate::models::book_info::BookInfo,
            crate::models::book_info::AddCopyRequest,
            crate::models::book_info::CatalogSearchResult,
            crate::models::book_copy::BookCopyDetails,
            crate::models::book_copy::CopyStatus,
            crate::models::book_copy::CopyAction,
            crate::models::book_copy::UpdateCopyRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SessionCookieAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Registration and sessions"),
        (name = "users", description = "User directory"),
        (name = "libraries", description = "Libraries, members and copies"),
        (name = "copies", description = "Borrowing and returning book copies"),
        (name = "books", description = "External catalog search")
    )
)]
pub struct ApiDoc;

/// Declares the session cookie referenced by `security(("session_cookie" = []))`
struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("libshare.sid"))),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
