//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, compression, tracing). Unknown
//! paths answer 404 and known paths with the wrong method 405, both as JSON.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::path::Path;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Router with the default body limit and no static directory.
pub fn create_router(state: AppState) -> Router {
    build_router(state, None, DEFAULT_BODY_LIMIT)
}

/// Full router; `static_dir` is served read-only under `/static`.
pub fn build_router(state: AppState, static_dir: Option<&Path>, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/events", get(handlers::stream_events))
        // Authors
        .route("/author", get(handlers::list_authors))
        .route("/author/menu", get(handlers::author_menu))
        .route("/author/create", post(handlers::create_author))
        .route(
            "/author/{id}",
            get(handlers::get_author)
                .put(handlers::update_author)
                .delete(handlers::delete_author),
        )
        // Books
        .route("/book", get(handlers::list_books))
        .route("/book/menu", get(handlers::book_menu))
        .route("/book/create", post(handlers::create_book))
        .route(
            "/book/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .route("/book/{id}/pdf", put(handlers::set_book_pdf))
        .route("/book/{id}/authors", put(handlers::set_book_authors))
        // Categories
        .route("/category", get(handlers::list_categories))
        .route("/category/create", post(handlers::create_category))
        .route(
            "/category/{id}",
            put(handlers::rename_category).delete(handlers::delete_category),
        )
        // Readers and their lists
        .route("/reader/create", post(handlers::create_reader))
        .route("/reader/{id}", get(handlers::get_reader))
        .route(
            "/reader/{id}/{kind}",
            get(handlers::get_reader_list).post(handlers::add_to_reader_list),
        )
        .route(
            "/reader/{id}/{kind}/{book_id}",
            delete(handlers::remove_from_reader_list),
        );

    if let Some(dir) = static_dir {
        tracing::info!(dir = %dir.display(), "serving static files under /static");
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
