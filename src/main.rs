//! Library Catalogue Backend
//!
//! REST backend for authors, publishers, books, borrow requests and ratings,
//! persisted in a SQLite document store.

mod api;
mod auth;
mod catalog;
mod config;
mod db;
mod errors;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::SessionAuthority;
use catalog::{BookCatalog, BorrowRecorder, RatingAggregator};
use config::Config;
use db::{DocumentStore, Repository, SqliteStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub books: BookCatalog,
    pub ratings: RatingAggregator,
    pub borrows: BorrowRecorder,
    pub sessions: Arc<SessionAuthority>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        let repo = Repository::new(store.clone());
        let sessions = SessionAuthority::new(
            config.admin_username.clone(),
            config.admin_password.clone(),
            store,
        );

        Self {
            books: BookCatalog::new(repo.clone()),
            ratings: RatingAggregator::new(repo.clone()),
            borrows: BorrowRecorder::new(repo.clone()),
            repo,
            sessions: Arc::new(sessions),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Library Catalogue Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.admin_password == "library123" {
        tracing::warn!("Operator password is the default (ADMIN_PASSWORD). Change it outside development!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::new(pool));

    let app = create_router(AppState::new(store, &config));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Open to everyone
    let public_routes = Router::new()
        .route("/login", post(api::login))
        .route("/health", get(api::health_check))
        // Authors
        .route("/authors", get(api::list_authors))
        .route("/authors/{id}", get(api::get_author))
        // Publishers
        .route("/pubs", get(api::list_publishers))
        .route("/pubs/{id}", get(api::get_publisher))
        // Books
        .route("/books", get(api::list_books))
        .route("/books/{id}", get(api::get_book))
        .route("/books/{id}/borrow", post(api::borrow_book))
        .route("/books/{id}/rate", post(api::rate_book));

    // Operator only
    let admin_routes = Router::new()
        .route("/logout", post(api::logout))
        .route("/session", get(api::session_info))
        // Authors
        .route("/authors", post(api::create_author))
        .route(
            "/authors/{id}",
            put(api::update_author).delete(api::delete_author),
        )
        // Publishers
        .route("/pubs", post(api::create_publisher))
        .route(
            "/pubs/{id}",
            put(api::update_publisher).delete(api::delete_publisher),
        )
        // Books
        .route("/books", post(api::create_book))
        .route("/books/{id}", put(api::update_book).delete(api::delete_book))
        // Borrow requests
        .route("/borrows", get(api::list_borrows))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
