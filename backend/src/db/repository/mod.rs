//! Repository traits: the storage seam between services and backends.
//!
//! Implementations must enforce the store-level rules the services rely on:
//! unique names/emails/list entries ([`RepositoryError::Conflict`]), existing
//! parents for every reference ([`RepositoryError::ForeignKey`]), and cascading
//! removal of join rows when an author or book is deleted.

mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;

use crate::models::{
    Author, AuthorId, AuthorSummary, Book, BookDetail, BookFilter, BookId, BookSummary, Category,
    CategoryId, ListKind, NewAuthor, NewBook, NewCategory, NewReader, Page, PageRequest, Reader,
    ReaderId, ReaderList,
};

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn create_author(&self, author: &NewAuthor) -> RepositoryResult<Author>;

    async fn get_author(&self, id: AuthorId) -> RepositoryResult<Author>;

    /// Authors ordered by id.
    async fn list_authors(&self, page: PageRequest) -> RepositoryResult<Page<Author>>;

    /// Every author, ordered by name, for the cached menu.
    async fn list_author_summaries(&self) -> RepositoryResult<Vec<AuthorSummary>>;

    /// Replace the stored row with `author` (matched by id).
    async fn update_author(&self, author: &Author) -> RepositoryResult<Author>;

    /// Delete the author and its book links.
    async fn delete_author(&self, id: AuthorId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn create_book(&self, book: &NewBook) -> RepositoryResult<Book>;

    async fn get_book(&self, id: BookId) -> RepositoryResult<Book>;

    async fn get_book_detail(&self, id: BookId) -> RepositoryResult<BookDetail>;

    /// Books ordered by id, optionally restricted to one category.
    async fn list_books(
        &self,
        filter: BookFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Book>>;

    /// Books that have at least one author, ordered by name, for the cached menu.
    async fn list_book_menu(&self) -> RepositoryResult<Vec<BookSummary>>;

    /// Replace the stored row (including images) with `book` (matched by id).
    async fn update_book(&self, book: &Book) -> RepositoryResult<Book>;

    async fn set_book_pdf(&self, id: BookId, pdf: &str) -> RepositoryResult<Book>;

    /// Replace every author link of the book.
    async fn set_book_authors(
        &self,
        id: BookId,
        authors: &[AuthorId],
    ) -> RepositoryResult<BookDetail>;

    /// Delete the book together with its images, author links and list entries.
    async fn delete_book(&self, id: BookId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category>;

    /// Categories ordered by name.
    async fn list_categories(&self) -> RepositoryResult<Vec<Category>>;

    async fn rename_category(
        &self,
        id: CategoryId,
        category: &NewCategory,
    ) -> RepositoryResult<Category>;

    /// Fails with a foreign-key error while any book references the category.
    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ReaderRepository: Send + Sync {
    async fn create_reader(&self, reader: &NewReader) -> RepositoryResult<Reader>;

    async fn get_reader(&self, id: ReaderId) -> RepositoryResult<Reader>;
}

#[async_trait]
pub trait ReaderListRepository: Send + Sync {
    /// The reader's full list of `kind`, most recently added first.
    async fn list_entries(&self, reader: ReaderId, kind: ListKind) -> RepositoryResult<ReaderList>;

    async fn add_list_entry(
        &self,
        reader: ReaderId,
        kind: ListKind,
        book: BookId,
    ) -> RepositoryResult<()>;

    /// Fails with not-found when the entry does not exist.
    async fn remove_list_entry(
        &self,
        reader: ReaderId,
        kind: ListKind,
        book: BookId,
    ) -> RepositoryResult<()>;
}

/// Connection pool counters, reported by pooled backends on `/health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Everything the HTTP layer needs from a backend.
#[async_trait]
pub trait FullRepository:
    AuthorRepository + BookRepository + CategoryRepository + ReaderRepository + ReaderListRepository
{
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// `None` for backends without a connection pool.
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}
