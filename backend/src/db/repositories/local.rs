//! In-memory repository for development and tests.
//!
//! Holds every table behind one `parking_lot` lock and applies the same rules a
//! relational store would: unique constraints, foreign keys and cascading deletes.
//! Each trait call takes the lock once, so every operation is atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::db::repository::{
    AuthorRepository, BookRepository, CategoryRepository, ErrorContext, FullRepository,
    ReaderListRepository, ReaderRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    Author, AuthorId, AuthorSummary, Book, BookDetail, BookFilter, BookId, BookRef, BookSummary,
    Category, CategoryId, ListEntry, ListKind, NewAuthor, NewBook, NewCategory, NewReader, Page,
    PageRequest, Reader, ReaderId, ReaderList,
};

#[derive(Debug, Clone)]
struct StoredEntry {
    added_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    entry_seq: u64,
    authors: BTreeMap<AuthorId, Author>,
    books: BTreeMap<BookId, Book>,
    categories: BTreeMap<CategoryId, Category>,
    readers: BTreeMap<ReaderId, Reader>,
    book_authors: BTreeSet<(BookId, AuthorId)>,
    list_entries: BTreeMap<(ReaderId, ListKind, BookId), StoredEntry>,
}

impl Tables {
    /// Ids come from one sequence so they never collide across tables.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn category_name_taken(&self, name: &str, except: Option<CategoryId>) -> bool {
        self.categories
            .values()
            .any(|c| Some(c.id) != except && c.name.eq_ignore_ascii_case(name))
    }

    fn check_category_ref(&self, category_id: Option<CategoryId>) -> RepositoryResult<()> {
        match category_id {
            Some(id) if !self.categories.contains_key(&id) => Err(RepositoryError::foreign_key(
                format!("category {} does not exist", id),
            )),
            _ => Ok(()),
        }
    }

    fn authors_of(&self, book: BookId) -> Vec<AuthorSummary> {
        let mut authors: Vec<AuthorSummary> = self
            .book_authors
            .range((book, AuthorId(i64::MIN))..=(book, AuthorId(i64::MAX)))
            .filter_map(|(_, author_id)| self.authors.get(author_id))
            .map(AuthorSummary::from)
            .collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        authors
    }

    fn detail(&self, id: BookId) -> RepositoryResult<BookDetail> {
        let book = self
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("book", id))?;
        let category = book
            .category_id
            .and_then(|category_id| self.categories.get(&category_id).cloned());
        Ok(BookDetail {
            authors: self.authors_of(id),
            category,
            book,
        })
    }
}

/// In-memory implementation of every repository trait.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    tables: Arc<RwLock<Tables>>,
    healthy: Arc<AtomicBool>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate the backing store going away.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn ensure_available(&self, operation: &str) -> RepositoryResult<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepositoryError::connection_with_context(
                "local repository marked unavailable",
                ErrorContext::new(operation),
            ))
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorRepository for LocalRepository {
    async fn create_author(&self, author: &NewAuthor) -> RepositoryResult<Author> {
        self.ensure_available("create_author")?;
        let mut tables = self.tables.write();
        let id = AuthorId::new(tables.next_id());
        let stored = author.clone().into_author(id);
        tables.authors.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_author(&self, id: AuthorId) -> RepositoryResult<Author> {
        self.ensure_available("get_author")?;
        self.tables
            .read()
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("author", id))
    }

    async fn list_authors(&self, page: PageRequest) -> RepositoryResult<Page<Author>> {
        self.ensure_available("list_authors")?;
        let all: Vec<Author> = self.tables.read().authors.values().cloned().collect();
        Ok(Page::from_sorted(all, page))
    }

    async fn list_author_summaries(&self) -> RepositoryResult<Vec<AuthorSummary>> {
        self.ensure_available("list_author_summaries")?;
        let mut summaries: Vec<AuthorSummary> = self
            .tables
            .read()
            .authors
            .values()
            .map(AuthorSummary::from)
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn update_author(&self, author: &Author) -> RepositoryResult<Author> {
        self.ensure_available("update_author")?;
        let mut tables = self.tables.write();
        let slot = tables
            .authors
            .get_mut(&author.id)
            .ok_or_else(|| RepositoryError::missing("author", author.id))?;
        *slot = author.clone();
        Ok(author.clone())
    }

    async fn delete_author(&self, id: AuthorId) -> RepositoryResult<()> {
        self.ensure_available("delete_author")?;
        let mut tables = self.tables.write();
        tables
            .authors
            .remove(&id)
            .ok_or_else(|| RepositoryError::missing("author", id))?;
        tables.book_authors.retain(|(_, author)| *author != id);
        Ok(())
    }
}

#[async_trait]
impl BookRepository for LocalRepository {
    async fn create_book(&self, book: &NewBook) -> RepositoryResult<Book> {
        self.ensure_available("create_book")?;
        let mut tables = self.tables.write();
        tables
            .check_category_ref(book.category_id)
            .map_err(|e| e.with_operation("create_book"))?;
        let id = BookId::new(tables.next_id());
        let stored = book.clone().into_book(id);
        tables.books.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_book(&self, id: BookId) -> RepositoryResult<Book> {
        self.ensure_available("get_book")?;
        self.tables
            .read()
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("book", id))
    }

    async fn get_book_detail(&self, id: BookId) -> RepositoryResult<BookDetail> {
        self.ensure_available("get_book_detail")?;
        self.tables.read().detail(id)
    }

    async fn list_books(
        &self,
        filter: BookFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Book>> {
        self.ensure_available("list_books")?;
        let all: Vec<Book> = self
            .tables
            .read()
            .books
            .values()
            .filter(|b| filter.category_id.is_none() || b.category_id == filter.category_id)
            .cloned()
            .collect();
        Ok(Page::from_sorted(all, page))
    }

    async fn list_book_menu(&self) -> RepositoryResult<Vec<BookSummary>> {
        self.ensure_available("list_book_menu")?;
        let tables = self.tables.read();
        let mut menu: Vec<BookSummary> = tables
            .books
            .values()
            .filter_map(|book| {
                let authors = tables.authors_of(book.id);
                if authors.is_empty() {
                    return None;
                }
                Some(BookSummary {
                    id: book.id,
                    name: book.name.clone(),
                    avatar: book.avatar.clone(),
                    authors,
                })
            })
            .collect();
        menu.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(menu)
    }

    async fn update_book(&self, book: &Book) -> RepositoryResult<Book> {
        self.ensure_available("update_book")?;
        let mut tables = self.tables.write();
        if !tables.books.contains_key(&book.id) {
            return Err(RepositoryError::missing("book", book.id));
        }
        tables
            .check_category_ref(book.category_id)
            .map_err(|e| e.with_operation("update_book"))?;
        tables.books.insert(book.id, book.clone());
        Ok(book.clone())
    }

    async fn set_book_pdf(&self, id: BookId, pdf: &str) -> RepositoryResult<Book> {
        self.ensure_available("set_book_pdf")?;
        let mut tables = self.tables.write();
        let book = tables
            .books
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::missing("book", id))?;
        book.pdf = Some(pdf.to_string());
        Ok(book.clone())
    }

    async fn set_book_authors(
        &self,
        id: BookId,
        authors: &[AuthorId],
    ) -> RepositoryResult<BookDetail> {
        self.ensure_available("set_book_authors")?;
        let mut tables = self.tables.write();
        if !tables.books.contains_key(&id) {
            return Err(RepositoryError::missing("book", id));
        }
        if let Some(missing) = authors.iter().find(|a| !tables.authors.contains_key(a)) {
            return Err(RepositoryError::foreign_key(format!(
                "author {} does not exist",
                missing
            ))
            .with_operation("set_book_authors"));
        }
        tables.book_authors.retain(|(book, _)| *book != id);
        for author in authors {
            tables.book_authors.insert((id, *author));
        }
        tables.detail(id)
    }

    async fn delete_book(&self, id: BookId) -> RepositoryResult<()> {
        self.ensure_available("delete_book")?;
        let mut tables = self.tables.write();
        tables
            .books
            .remove(&id)
            .ok_or_else(|| RepositoryError::missing("book", id))?;
        tables.book_authors.retain(|(book, _)| *book != id);
        tables.list_entries.retain(|(_, _, book), _| *book != id);
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for LocalRepository {
    async fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category> {
        self.ensure_available("create_category")?;
        let mut tables = self.tables.write();
        let name = category.name.trim();
        if tables.category_name_taken(name, None) {
            return Err(RepositoryError::conflict(format!(
                "category '{}' already exists",
                name
            )));
        }
        let stored = Category {
            id: CategoryId::new(tables.next_id()),
            name: name.to_string(),
        };
        tables.categories.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        self.ensure_available("list_categories")?;
        let mut categories: Vec<Category> =
            self.tables.read().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        category: &NewCategory,
    ) -> RepositoryResult<Category> {
        self.ensure_available("rename_category")?;
        let mut tables = self.tables.write();
        let name = category.name.trim();
        if !tables.categories.contains_key(&id) {
            return Err(RepositoryError::missing("category", id));
        }
        if tables.category_name_taken(name, Some(id)) {
            return Err(RepositoryError::conflict(format!(
                "category '{}' already exists",
                name
            )));
        }
        let stored = Category {
            id,
            name: name.to_string(),
        };
        tables.categories.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<()> {
        self.ensure_available("delete_category")?;
        let mut tables = self.tables.write();
        if !tables.categories.contains_key(&id) {
            return Err(RepositoryError::missing("category", id));
        }
        if tables.books.values().any(|b| b.category_id == Some(id)) {
            return Err(RepositoryError::foreign_key(format!(
                "category {} is still used by books",
                id
            )));
        }
        tables.categories.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ReaderRepository for LocalRepository {
    async fn create_reader(&self, reader: &NewReader) -> RepositoryResult<Reader> {
        self.ensure_available("create_reader")?;
        let mut tables = self.tables.write();
        let email = reader.normalized_email();
        if tables.readers.values().any(|r| r.email == email) {
            return Err(RepositoryError::conflict(format!(
                "reader with email {} already exists",
                email
            )));
        }
        let stored = Reader {
            id: ReaderId::new(tables.next_id()),
            name: reader.name.trim().to_string(),
            email,
            created_at: Utc::now(),
        };
        tables.readers.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_reader(&self, id: ReaderId) -> RepositoryResult<Reader> {
        self.ensure_available("get_reader")?;
        self.tables
            .read()
            .readers
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("reader", id))
    }
}

#[async_trait]
impl ReaderListRepository for LocalRepository {
    async fn list_entries(&self, reader: ReaderId, kind: ListKind) -> RepositoryResult<ReaderList> {
        self.ensure_available("list_entries")?;
        let tables = self.tables.read();
        if !tables.readers.contains_key(&reader) {
            return Err(RepositoryError::missing("reader", reader));
        }

        let mut rows: Vec<(&StoredEntry, &Book)> = tables
            .list_entries
            .iter()
            .filter(|((r, k, _), _)| *r == reader && *k == kind)
            .filter_map(|((_, _, book_id), entry)| {
                tables.books.get(book_id).map(|book| (entry, book))
            })
            .collect();
        rows.sort_by(|a, b| b.0.seq.cmp(&a.0.seq));

        Ok(ReaderList {
            reader_id: reader,
            kind,
            books: rows
                .into_iter()
                .map(|(entry, book)| ListEntry {
                    book: BookRef::from(book),
                    added_at: entry.added_at,
                })
                .collect(),
        })
    }

    async fn add_list_entry(
        &self,
        reader: ReaderId,
        kind: ListKind,
        book: BookId,
    ) -> RepositoryResult<()> {
        self.ensure_available("add_list_entry")?;
        let mut tables = self.tables.write();
        if !tables.readers.contains_key(&reader) {
            return Err(RepositoryError::foreign_key(format!(
                "reader {} does not exist",
                reader
            )));
        }
        if !tables.books.contains_key(&book) {
            return Err(RepositoryError::foreign_key(format!(
                "book {} does not exist",
                book
            )));
        }
        let key = (reader, kind, book);
        if tables.list_entries.contains_key(&key) {
            return Err(RepositoryError::conflict(format!(
                "book {} is already in the {} list",
                book, kind
            )));
        }
        tables.entry_seq += 1;
        let entry = StoredEntry {
            added_at: Utc::now(),
            seq: tables.entry_seq,
        };
        tables.list_entries.insert(key, entry);
        Ok(())
    }

    async fn remove_list_entry(
        &self,
        reader: ReaderId,
        kind: ListKind,
        book: BookId,
    ) -> RepositoryResult<()> {
        self.ensure_available("remove_list_entry")?;
        self.tables
            .write()
            .list_entries
            .remove(&(reader, kind, book))
            .map(|_| ())
            .ok_or_else(|| {
                RepositoryError::not_found(format!("book {} is not in the {} list", book, kind))
            })
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }
}
