//! HTTP handlers for the REST API.
//!
//! Handlers parse the path and query, hand decoded bodies to the service
//! layer, and run the output check on whatever they send back.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;

use super::dto::{BookListQuery, HealthResponse, PageQuery};
use super::error::AppError;
use super::extract::{checked, created, path_id, query_error, ValidJson};
use super::state::AppState;
use crate::events::{EventPublisher, ListEvent};
use crate::models::{
    Author, AuthorId, AuthorLinks, AuthorPatch, AuthorSummary, Book, BookDetail, BookId,
    BookPatch, BookSummary, Category, CategoryId, ListAddition, ListKind, NewAuthor, NewBook,
    NewCategory, NewReader, Page, PdfUpdate, Reader, ReaderId, ReaderList,
};
use crate::services::{authors, books, categories, reader_lists, readers};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn page_query(query: Result<Query<PageQuery>, QueryRejection>) -> Result<PageQuery, AppError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| query_error(e.body_text()))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let (status, database) = match state.repository.health_check().await {
        Ok(true) => ("ok", "connected".to_string()),
        Ok(false) => ("degraded", "disconnected".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            ("degraded", "unreachable".to_string())
        }
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        cache: state.cache.backend().to_string(),
        events: state.events.backend().to_string(),
        pool: state.repository.pool_stats(),
    }))
}

// =============================================================================
// Authors
// =============================================================================

/// GET /author?page=&page_size=
pub async fn list_authors(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> HandlerResult<Page<Author>> {
    let page = page_query(query)?.request();
    checked(authors::list(state.repository.as_ref(), page).await?)
}

/// GET /author/menu
pub async fn author_menu(State(state): State<AppState>) -> HandlerResult<Vec<AuthorSummary>> {
    checked(authors::menu(state.repository.as_ref(), state.cache.as_ref()).await?)
}

/// GET /author/{id}
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Author> {
    let id: AuthorId = path_id("author", &id)?;
    checked(authors::get(state.repository.as_ref(), id).await?)
}

/// POST /author/create
pub async fn create_author(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<NewAuthor>,
) -> Result<impl IntoResponse, AppError> {
    created(authors::create(state.repository.as_ref(), state.cache.as_ref(), &body).await?)
}

/// PUT /author/{id}
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<AuthorPatch>,
) -> HandlerResult<Author> {
    let id: AuthorId = path_id("author", &id)?;
    checked(authors::update(state.repository.as_ref(), state.cache.as_ref(), id, patch).await?)
}

/// DELETE /author/{id}
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: AuthorId = path_id("author", &id)?;
    authors::delete(state.repository.as_ref(), state.cache.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Books
// =============================================================================

/// GET /book?page=&page_size=&category_id=
pub async fn list_books(
    State(state): State<AppState>,
    query: Result<Query<BookListQuery>, QueryRejection>,
) -> HandlerResult<Page<Book>> {
    let Query(query) = query.map_err(|e| query_error(e.body_text()))?;
    checked(books::list(state.repository.as_ref(), query.filter(), query.request()).await?)
}

/// GET /book/menu
pub async fn book_menu(State(state): State<AppState>) -> HandlerResult<Vec<BookSummary>> {
    checked(books::menu(state.repository.as_ref(), state.cache.as_ref()).await?)
}

/// GET /book/{id}
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<BookDetail> {
    let id: BookId = path_id("book", &id)?;
    checked(books::detail(state.repository.as_ref(), id).await?)
}

/// POST /book/create
pub async fn create_book(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<NewBook>,
) -> Result<impl IntoResponse, AppError> {
    created(books::create(state.repository.as_ref(), state.cache.as_ref(), &body).await?)
}

/// PUT /book/{id}
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<BookPatch>,
) -> HandlerResult<Book> {
    let id: BookId = path_id("book", &id)?;
    checked(books::update(state.repository.as_ref(), state.cache.as_ref(), id, patch).await?)
}

/// PUT /book/{id}/pdf
pub async fn set_book_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<PdfUpdate>,
) -> HandlerResult<Book> {
    let id: BookId = path_id("book", &id)?;
    checked(books::set_pdf(state.repository.as_ref(), id, &body).await?)
}

/// PUT /book/{id}/authors
pub async fn set_book_authors(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<AuthorLinks>,
) -> HandlerResult<BookDetail> {
    let id: BookId = path_id("book", &id)?;
    checked(books::set_authors(state.repository.as_ref(), state.cache.as_ref(), id, &body).await?)
}

/// DELETE /book/{id}
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: BookId = path_id("book", &id)?;
    books::delete(state.repository.as_ref(), state.cache.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

/// GET /category
pub async fn list_categories(State(state): State<AppState>) -> HandlerResult<Vec<Category>> {
    checked(categories::list(state.repository.as_ref()).await?)
}

/// POST /category/create
pub async fn create_category(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<NewCategory>,
) -> Result<impl IntoResponse, AppError> {
    created(categories::create(state.repository.as_ref(), &body).await?)
}

/// PUT /category/{id}
pub async fn rename_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<NewCategory>,
) -> HandlerResult<Category> {
    let id: CategoryId = path_id("category", &id)?;
    checked(categories::rename(state.repository.as_ref(), id, &body).await?)
}

/// DELETE /category/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: CategoryId = path_id("category", &id)?;
    categories::delete(state.repository.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Readers and reader lists
// =============================================================================

/// POST /reader/create
pub async fn create_reader(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<NewReader>,
) -> Result<impl IntoResponse, AppError> {
    created(readers::create(state.repository.as_ref(), &body).await?)
}

/// GET /reader/{id}
pub async fn get_reader(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Reader> {
    let id: ReaderId = path_id("reader", &id)?;
    checked(readers::get(state.repository.as_ref(), id).await?)
}

fn list_path(reader: &str, kind: &str) -> Result<(ReaderId, ListKind), AppError> {
    let reader: ReaderId = path_id("reader", reader)?;
    let kind: ListKind = kind
        .parse()
        .map_err(|_| AppError::NotFound(format!("unknown list '{}'", kind)))?;
    Ok((reader, kind))
}

/// GET /reader/{id}/{kind}
pub async fn get_reader_list(
    State(state): State<AppState>,
    Path((reader, kind)): Path<(String, String)>,
) -> HandlerResult<ReaderList> {
    let (reader, kind) = list_path(&reader, &kind)?;
    checked(reader_lists::get(state.repository.as_ref(), reader, kind).await?)
}

/// POST /reader/{id}/{kind}
pub async fn add_to_reader_list(
    State(state): State<AppState>,
    Path((reader, kind)): Path<(String, String)>,
    ValidJson(body): ValidJson<ListAddition>,
) -> Result<impl IntoResponse, AppError> {
    let (reader, kind) = list_path(&reader, &kind)?;
    created(
        reader_lists::add(
            state.repository.as_ref(),
            &state.events,
            reader,
            kind,
            body.book_id,
        )
        .await?,
    )
}

/// DELETE /reader/{id}/{kind}/{book_id}
pub async fn remove_from_reader_list(
    State(state): State<AppState>,
    Path((reader, kind, book)): Path<(String, String, String)>,
) -> HandlerResult<ReaderList> {
    let (reader, kind) = list_path(&reader, &kind)?;
    let book: BookId = path_id("book", &book)?;
    checked(
        reader_lists::remove(state.repository.as_ref(), &state.events, reader, kind, book).await?,
    )
}

// =============================================================================
// Event stream
// =============================================================================

/// One SSE frame per list event; an event that cannot be encoded is
/// logged and skipped.
fn list_event_frame(event: &ListEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(data) => Some(
            Event::default()
                .id(event.id.to_string())
                .event(event.event.as_str())
                .data(data),
        ),
        Err(e) => {
            tracing::warn!(event = %event.event, error = %e, "skipping unencodable list event");
            None
        }
    }
}

/// GET /events
///
/// Server-sent events: one `event:` per published list change, named after
/// the list (`favorite_books`, `read_late`, `used_read`).
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.events.subscribe();
    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(frame) = list_event_frame(&event) {
                        yield Ok(frame);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged");
                    yield Ok(Event::default()
                        .event("lagged")
                        .data(skipped.to_string()));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.keep_alive)
            .text("keep-alive"),
    )
}

// =============================================================================
// Fallbacks
// =============================================================================

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
