//! Postgres repository implementation using Diesel.
//!
//! The schema lives in `migrations/` and is applied when the repository is
//! created. Unique indexes and foreign keys in the schema carry the catalog
//! rules: duplicate category names, reader emails and list entries surface as
//! [`RepositoryError::Conflict`], dangling references as
//! [`RepositoryError::ForeignKey`]. Deleting a book or author cascades to its
//! join rows; deleting a referenced category is restricted.
//!
//! [`PostgresConfig`] is filled in by `AppConfig` from the `[postgres]` table
//! and the `DATABASE_URL` / `PG_*` variables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    AuthorRepository, BookRepository, CategoryRepository, ErrorContext, FullRepository,
    PoolStats, ReaderListRepository, ReaderRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    Author, AuthorId, AuthorSummary, Book, BookDetail, BookFilter, BookId, BookRef, BookSummary,
    Category, CategoryId, ListEntry, ListKind, NewAuthor, NewBook, NewCategory, NewReader, Page,
    PageRequest, Reader, ReaderId, ReaderList,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times when the pool cannot hand out a
    /// connection or the operation fails with a retryable error.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(operation, attempt, "retrying database operation");
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new(operation)
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn page_bounds(page: PageRequest) -> (i64, i64) {
    (page.offset() as i64, page.limit() as i64)
}

/// Image paths per book, in position order.
fn load_images(
    conn: &mut PgConnection,
    book_ids: &[i64],
) -> RepositoryResult<HashMap<i64, Vec<String>>> {
    let rows: Vec<(i64, String)> = book_images::table
        .filter(book_images::book_id.eq_any(book_ids))
        .order((book_images::book_id.asc(), book_images::position.asc()))
        .select((book_images::book_id, book_images::path))
        .load(conn)
        .map_err(map_diesel_error)?;

    let mut images: HashMap<i64, Vec<String>> = HashMap::new();
    for (book_id, path) in rows {
        images.entry(book_id).or_default().push(path);
    }
    Ok(images)
}

fn replace_images(conn: &mut PgConnection, book_id: i64, paths: &[String]) -> RepositoryResult<()> {
    diesel::delete(book_images::table.filter(book_images::book_id.eq(book_id)))
        .execute(conn)
        .map_err(map_diesel_error)?;

    if paths.is_empty() {
        return Ok(());
    }

    let rows: Vec<NewBookImageRow> = paths
        .iter()
        .enumerate()
        .map(|(idx, path)| NewBookImageRow {
            book_id,
            position: idx as i32,
            path: path.clone(),
        })
        .collect();
    diesel::insert_into(book_images::table)
        .values(&rows)
        .execute(conn)
        .map_err(map_diesel_error)?;
    Ok(())
}

fn rows_to_books(conn: &mut PgConnection, rows: Vec<BookRow>) -> RepositoryResult<Vec<Book>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut images = load_images(conn, &ids)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let paths = images.remove(&row.id).unwrap_or_default();
            row.into_book(paths)
        })
        .collect())
}

fn find_book(conn: &mut PgConnection, id: BookId) -> RepositoryResult<Book> {
    let row = books::table
        .find(id.value())
        .select(BookRow::as_select())
        .first(conn)
        .optional()
        .map_err(map_diesel_error)?
        .ok_or_else(|| RepositoryError::missing("book", id))?;
    let mut books = rows_to_books(conn, vec![row])?;
    books
        .pop()
        .ok_or_else(|| RepositoryError::internal(format!("book {} vanished while loading", id)))
}

/// Authors of one book, ordered by name.
fn authors_of(conn: &mut PgConnection, id: BookId) -> RepositoryResult<Vec<AuthorSummary>> {
    let rows: Vec<AuthorSummaryRow> = book_authors::table
        .inner_join(authors::table)
        .filter(book_authors::book_id.eq(id.value()))
        .order((authors::name.asc(), authors::id.asc()))
        .select(AuthorSummaryRow::as_select())
        .load(conn)
        .map_err(map_diesel_error)?;
    Ok(rows.into_iter().map(AuthorSummary::from).collect())
}

fn book_detail(conn: &mut PgConnection, id: BookId) -> RepositoryResult<BookDetail> {
    let book = find_book(conn, id)?;
    let category = match book.category_id {
        Some(category_id) => categories::table
            .find(category_id.value())
            .select(CategoryRow::as_select())
            .first(conn)
            .optional()
            .map_err(map_diesel_error)?
            .map(Category::from),
        None => None,
    };
    let authors = authors_of(conn, id)?;
    Ok(BookDetail {
        book,
        category,
        authors,
    })
}

#[async_trait]
impl AuthorRepository for PostgresRepository {
    async fn create_author(&self, author: &NewAuthor) -> RepositoryResult<Author> {
        let changes = AuthorChanges::new(
            &author.name,
            author.sex,
            author.avatar.as_ref(),
            author.birth_year,
            author.death_year,
            author.story.as_ref(),
        );
        self.with_conn("create_author", move |conn| {
            diesel::insert_into(authors::table)
                .values(&changes)
                .returning(AuthorRow::as_returning())
                .get_result::<AuthorRow>(conn)
                .map_err(map_diesel_error)?
                .into_author()
        })
        .await
    }

    async fn get_author(&self, id: AuthorId) -> RepositoryResult<Author> {
        self.with_conn("get_author", move |conn| {
            authors::table
                .find(id.value())
                .select(AuthorRow::as_select())
                .first::<AuthorRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| RepositoryError::missing("author", id))?
                .into_author()
        })
        .await
    }

    async fn list_authors(&self, page: PageRequest) -> RepositoryResult<Page<Author>> {
        self.with_conn("list_authors", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let total: i64 = authors::table.count().get_result(tx)?;
                let (offset, limit) = page_bounds(page);
                let rows: Vec<AuthorRow> = authors::table
                    .order(authors::id.asc())
                    .offset(offset)
                    .limit(limit)
                    .select(AuthorRow::as_select())
                    .load(tx)?;
                let items = rows
                    .into_iter()
                    .map(AuthorRow::into_author)
                    .collect::<RepositoryResult<Vec<_>>>()?;
                Ok(Page::new(items, total as u64, page))
            })
        })
        .await
    }

    async fn list_author_summaries(&self) -> RepositoryResult<Vec<AuthorSummary>> {
        self.with_conn("list_author_summaries", |conn| {
            let rows: Vec<AuthorSummaryRow> = authors::table
                .order((authors::name.asc(), authors::id.asc()))
                .select(AuthorSummaryRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(AuthorSummary::from).collect())
        })
        .await
    }

    async fn update_author(&self, author: &Author) -> RepositoryResult<Author> {
        let id = author.id;
        let changes = AuthorChanges::new(
            &author.name,
            author.sex,
            author.avatar.as_ref(),
            author.birth_year,
            author.death_year,
            author.story.as_ref(),
        );
        self.with_conn("update_author", move |conn| {
            diesel::update(authors::table.find(id.value()))
                .set(&changes)
                .returning(AuthorRow::as_returning())
                .get_result::<AuthorRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| RepositoryError::missing("author", id))?
                .into_author()
        })
        .await
    }

    async fn delete_author(&self, id: AuthorId) -> RepositoryResult<()> {
        self.with_conn("delete_author", move |conn| {
            let deleted = diesel::delete(authors::table.find(id.value()))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::missing("author", id));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl BookRepository for PostgresRepository {
    async fn create_book(&self, book: &NewBook) -> RepositoryResult<Book> {
        let changes = BookChanges::new(
            &book.name,
            book.avatar.as_ref(),
            book.published_day,
            book.category_id,
            book.introduce.as_ref(),
        );
        let images = book.images.clone();
        self.with_conn("create_book", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let row: BookRow = diesel::insert_into(books::table)
                    .values(&changes)
                    .returning(BookRow::as_returning())
                    .get_result(tx)?;
                replace_images(tx, row.id, &images)?;
                Ok(row.into_book(images.clone()))
            })
        })
        .await
    }

    async fn get_book(&self, id: BookId) -> RepositoryResult<Book> {
        self.with_conn("get_book", move |conn| find_book(conn, id))
            .await
    }

    async fn get_book_detail(&self, id: BookId) -> RepositoryResult<BookDetail> {
        self.with_conn("get_book_detail", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| book_detail(tx, id))
        })
        .await
    }

    async fn list_books(
        &self,
        filter: BookFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Book>> {
        self.with_conn("list_books", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let total: i64 = match filter.category_id {
                    Some(category) => books::table
                        .filter(books::category_id.eq(category.value()))
                        .count()
                        .get_result(tx)?,
                    None => books::table.count().get_result(tx)?,
                };

                let (offset, limit) = page_bounds(page);
                let mut query = books::table
                    .select(BookRow::as_select())
                    .order(books::id.asc())
                    .offset(offset)
                    .limit(limit)
                    .into_boxed();
                if let Some(category) = filter.category_id {
                    query = query.filter(books::category_id.eq(category.value()));
                }
                let rows: Vec<BookRow> = query.load(tx)?;
                let items = rows_to_books(tx, rows)?;
                Ok(Page::new(items, total as u64, page))
            })
        })
        .await
    }

    async fn list_book_menu(&self) -> RepositoryResult<Vec<BookSummary>> {
        self.with_conn("list_book_menu", |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let links: Vec<(i64, AuthorSummaryRow)> = book_authors::table
                    .inner_join(authors::table)
                    .order((authors::name.asc(), authors::id.asc()))
                    .select((book_authors::book_id, AuthorSummaryRow::as_select()))
                    .load(tx)?;

                let mut authors_by_book: HashMap<i64, Vec<AuthorSummary>> = HashMap::new();
                for (book_id, author) in links {
                    authors_by_book
                        .entry(book_id)
                        .or_default()
                        .push(AuthorSummary::from(author));
                }
                let ids: Vec<i64> = authors_by_book.keys().copied().collect();

                let rows: Vec<(i64, String, Option<String>)> = books::table
                    .filter(books::id.eq_any(&ids))
                    .order((books::name.asc(), books::id.asc()))
                    .select((books::id, books::name, books::avatar))
                    .load(tx)?;

                Ok(rows
                    .into_iter()
                    .map(|(id, name, avatar)| BookSummary {
                        id: BookId::new(id),
                        name,
                        avatar,
                        authors: authors_by_book.remove(&id).unwrap_or_default(),
                    })
                    .collect())
            })
        })
        .await
    }

    async fn update_book(&self, book: &Book) -> RepositoryResult<Book> {
        let id = book.id;
        let changes = BookChanges::new(
            &book.name,
            book.avatar.as_ref(),
            book.published_day,
            book.category_id,
            book.introduce.as_ref(),
        );
        let images = book.images.clone();
        self.with_conn("update_book", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let row: BookRow = diesel::update(books::table.find(id.value()))
                    .set(&changes)
                    .returning(BookRow::as_returning())
                    .get_result(tx)
                    .optional()?
                    .ok_or_else(|| RepositoryError::missing("book", id))?;
                replace_images(tx, row.id, &images)?;
                Ok(row.into_book(images.clone()))
            })
        })
        .await
    }

    async fn set_book_pdf(&self, id: BookId, pdf: &str) -> RepositoryResult<Book> {
        let pdf = pdf.to_string();
        self.with_conn("set_book_pdf", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let updated = diesel::update(books::table.find(id.value()))
                    .set(books::pdf.eq(Some(pdf.as_str())))
                    .execute(tx)?;
                if updated == 0 {
                    return Err(RepositoryError::missing("book", id));
                }
                find_book(tx, id)
            })
        })
        .await
    }

    async fn set_book_authors(
        &self,
        id: BookId,
        authors: &[AuthorId],
    ) -> RepositoryResult<BookDetail> {
        let links: Vec<BookAuthorRow> = authors
            .iter()
            .map(|author| BookAuthorRow {
                book_id: id.value(),
                author_id: author.value(),
            })
            .collect();
        self.with_conn("set_book_authors", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let exists: i64 = books::table
                    .filter(books::id.eq(id.value()))
                    .count()
                    .get_result(tx)?;
                if exists == 0 {
                    return Err(RepositoryError::missing("book", id));
                }

                diesel::delete(book_authors::table.filter(book_authors::book_id.eq(id.value())))
                    .execute(tx)?;
                if !links.is_empty() {
                    diesel::insert_into(book_authors::table)
                        .values(&links)
                        .execute(tx)?;
                }
                book_detail(tx, id)
            })
        })
        .await
    }

    async fn delete_book(&self, id: BookId) -> RepositoryResult<()> {
        self.with_conn("delete_book", move |conn| {
            let deleted = diesel::delete(books::table.find(id.value()))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::missing("book", id));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl CategoryRepository for PostgresRepository {
    async fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category> {
        let changes = CategoryChanges {
            name: category.name.trim().to_string(),
        };
        self.with_conn("create_category", move |conn| {
            diesel::insert_into(categories::table)
                .values(&changes)
                .returning(CategoryRow::as_returning())
                .get_result::<CategoryRow>(conn)
                .map(Category::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        self.with_conn("list_categories", |conn| {
            let rows: Vec<CategoryRow> = categories::table
                .order(categories::name.asc())
                .select(CategoryRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Category::from).collect())
        })
        .await
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        category: &NewCategory,
    ) -> RepositoryResult<Category> {
        let changes = CategoryChanges {
            name: category.name.trim().to_string(),
        };
        self.with_conn("rename_category", move |conn| {
            diesel::update(categories::table.find(id.value()))
                .set(&changes)
                .returning(CategoryRow::as_returning())
                .get_result::<CategoryRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Category::from)
                .ok_or_else(|| RepositoryError::missing("category", id))
        })
        .await
    }

    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<()> {
        self.with_conn("delete_category", move |conn| {
            let deleted = diesel::delete(categories::table.find(id.value()))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::missing("category", id));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ReaderRepository for PostgresRepository {
    async fn create_reader(&self, reader: &NewReader) -> RepositoryResult<Reader> {
        let row = NewReaderRow {
            name: reader.name.trim().to_string(),
            email: reader.normalized_email(),
        };
        self.with_conn("create_reader", move |conn| {
            diesel::insert_into(readers::table)
                .values(&row)
                .returning(ReaderRow::as_returning())
                .get_result::<ReaderRow>(conn)
                .map(Reader::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_reader(&self, id: ReaderId) -> RepositoryResult<Reader> {
        self.with_conn("get_reader", move |conn| {
            readers::table
                .find(id.value())
                .select(ReaderRow::as_select())
                .first::<ReaderRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Reader::from)
                .ok_or_else(|| RepositoryError::missing("reader", id))
        })
        .await
    }
}

#[async_trait]
impl ReaderListRepository for PostgresRepository {
    async fn list_entries(&self, reader: ReaderId, kind: ListKind) -> RepositoryResult<ReaderList> {
        self.with_conn("list_entries", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let exists: i64 = readers::table
                    .filter(readers::id.eq(reader.value()))
                    .count()
                    .get_result(tx)?;
                if exists == 0 {
                    return Err(RepositoryError::missing("reader", reader));
                }

                let rows: Vec<((i64, String, Option<String>), DateTime<Utc>)> =
                    reader_list_entries::table
                        .inner_join(books::table)
                        .filter(reader_list_entries::reader_id.eq(reader.value()))
                        .filter(reader_list_entries::list_kind.eq(kind.as_str()))
                        .order((
                            reader_list_entries::added_at.desc(),
                            reader_list_entries::book_id.desc(),
                        ))
                        .select((
                            (books::id, books::name, books::avatar),
                            reader_list_entries::added_at,
                        ))
                        .load(tx)?;

                Ok(ReaderList {
                    reader_id: reader,
                    kind,
                    books: rows
                        .into_iter()
                        .map(|((id, name, avatar), added_at)| ListEntry {
                            book: BookRef {
                                id: BookId::new(id),
                                name,
                                avatar,
                            },
                            added_at,
                        })
                        .collect(),
                })
            })
        })
        .await
    }

    async fn add_list_entry(
        &self,
        reader: ReaderId,
        kind: ListKind,
        book: BookId,
    ) -> RepositoryResult<()> {
        let row = NewListEntryRow {
            reader_id: reader.value(),
            list_kind: kind.as_str().to_string(),
            book_id: book.value(),
        };
        self.with_conn("add_list_entry", move |conn| {
            diesel::insert_into(reader_list_entries::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn remove_list_entry(
        &self,
        reader: ReaderId,
        kind: ListKind,
        book: BookId,
    ) -> RepositoryResult<()> {
        self.with_conn("remove_list_entry", move |conn| {
            let deleted = diesel::delete(
                reader_list_entries::table
                    .filter(reader_list_entries::reader_id.eq(reader.value()))
                    .filter(reader_list_entries::list_kind.eq(kind.as_str()))
                    .filter(reader_list_entries::book_id.eq(book.value())),
            )
            .execute(conn)
            .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found(format!(
                    "book {} is not in the {} list",
                    book, kind
                )));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        let state = self.pool.state();
        Some(PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        })
    }
}
