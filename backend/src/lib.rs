//! # Bookcase Backend
//!
//! REST backend for a small library catalog: authors, books, categories and
//! per-reader book lists.
//!
//! ## Features
//!
//! - **Catalog CRUD**: Authors, books (with images, pdf and author links) and categories
//! - **Reader lists**: `favorite_books`, `read_late` and `used_read`, published as events on change
//! - **Menus**: Read-through Redis cache of the author and book menus
//! - **Validation**: Strict request decoding plus checks on every response body
//! - **HTTP API**: Axum server with a server-sent event feed of list changes
//!
//! ## Architecture
//!
//! - [`api`]: Wire types in one place
//! - [`models`]: Domain types, request bodies and their checks
//! - [`validation`]: Body decoding and the field error model
//! - [`db`]: Repository traits with in-memory and PostgreSQL backends
//! - [`cache`]: Menu list cache (Redis or in-memory)
//! - [`events`]: List event publishers (Redis pub/sub, in-memory, SSE fan-out)
//! - [`services`]: Catalog operations tying store, cache and events together
//! - [`config`]: TOML + environment configuration
//! - [`http`]: Axum router, handlers and error envelope
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod cache;
pub mod config;
pub mod db;
pub mod events;
pub mod models;
pub mod services;
pub mod validation;

#[cfg(feature = "http-server")]
pub mod http;
