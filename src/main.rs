//! Libshare Server
//!
//! REST API server for sharing books between neighbourhood libraries.

use anyhow::Context;
use axum::{
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libshare_server::{
    api,
    config::AppConfig,
    error::expose_internal_errors,
    repository::Repository,
    services::{sessions::SessionStore, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("libshare_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        environment = %config.server.environment,
        "Starting Libshare Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    expose_internal_errors(!config.is_production());

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let sessions = SessionStore::new(&config.redis.url, &config.sessions)
        .await
        .context("Failed to connect to Redis")?;

    tracing::info!("Connected to Redis");

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config, sessions).context("Failed to create services")?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // Session cookies need credentialed CORS, which rules out wildcard origins
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Accounts
        .route(
            "/accounts",
            get(api::accounts::current_account).post(api::accounts::register),
        )
        .route(
            "/accounts/session",
            post(api::accounts::login).delete(api::accounts::logout),
        )
        // Users
        .route("/users", get(api::users::list_users).post(api::users::create_user))
        .route("/users/:username", get(api::users::get_user))
        // Libraries
        .route(
            "/libraries",
            get(api::libraries::list_libraries).post(api::libraries::create_library),
        )
        .route(
            "/libraries/:id",
            get(api::libraries::get_library)
                .patch(api::libraries::update_library)
                .delete(api::libraries::delete_library),
        )
        .route(
            "/libraries/:id/members",
            get(api::libraries::list_members)
                .post(api::libraries::join_library)
                .delete(api::libraries::leave_library),
        )
        .route("/libraries/:id/copies", post(api::libraries::add_copy))
        .route("/libraries/:id/copies/:copy_id", delete(api::libraries::remove_copy))
        // Copies
        .route(
            "/copies/:id",
            get(api::copies::get_copy).patch(api::copies::update_copy),
        )
        // Books
        .route("/books/search", get(api::books::search_books))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
