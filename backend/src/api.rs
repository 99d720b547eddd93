//! Public API surface of the bookcase backend.
//!
//! Collects every type that crosses the wire so clients and tests can depend
//! on one module instead of reaching into `models`, `events` and `http`.
//! All types derive Serialize/Deserialize.

pub use crate::events::ListEvent;
pub use crate::models::{
    Author, AuthorId, AuthorLinks, AuthorPatch, AuthorSummary, Book, BookDetail, BookFilter,
    BookId, BookPatch, BookRef, BookSummary, Category, CategoryId, FilePair, ListAddition,
    ListEntry, ListKind, NewAuthor, NewBook, NewCategory, NewReader, Page, PageRequest,
    PdfUpdate, Reader, ReaderId, ReaderList, Sex,
};
pub use crate::validation::FieldError;

#[cfg(feature = "http-server")]
pub use crate::http::dto::HealthResponse;
#[cfg(feature = "http-server")]
pub use crate::http::ApiError;
