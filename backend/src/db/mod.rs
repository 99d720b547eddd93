//! Persistence layer for the catalog.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  services (validation, cache, events)        │
//! └───────────────────┬──────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────┐
//! │  repository traits (repository/mod.rs)       │
//! └───────────────────┬──────────────────────────┘
//!          ┌──────────┴───────────┐
//!   ┌──────▼──────┐       ┌───────▼────────┐
//!   │   local     │       │   postgres     │
//!   │ (in-memory) │       │ (Diesel + r2d2)│
//!   └─────────────┘       └────────────────┘
//! ```
//!
//! Use [`RepositoryFactory`] to build a backend at startup and hand the
//! resulting `Arc<dyn FullRepository>` to the services.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
}

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AuthorRepository, BookRepository, CategoryRepository, ErrorContext, FullRepository,
    PoolStats, ReaderListRepository, ReaderRepository, RepositoryError, RepositoryResult,
};
