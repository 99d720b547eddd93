//! Service layer: the catalog operations behind the HTTP handlers.
//!
//! Each function takes the collaborators it needs explicitly (repository,
//! list cache, event publisher) so it can run against any backend. Request
//! bodies arrive already decoded and checked; services add the checks that
//! need stored state (merged updates) and keep the menu caches and list
//! events in step with the store.

pub mod authors;
pub mod books;
pub mod categories;
pub mod reader_lists;
pub mod readers;

use thiserror::Error;

use crate::cache::CacheError;
use crate::db::repository::RepositoryError;
use crate::events::PublishError;
use crate::validation::FieldError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<Vec<FieldError>> for ServiceError {
    fn from(errors: Vec<FieldError>) -> Self {
        ServiceError::Validation(errors)
    }
}
