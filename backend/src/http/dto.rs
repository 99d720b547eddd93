//! Query strings and bodies that only exist at the HTTP edge.
//!
//! Entity bodies (`NewAuthor`, `BookPatch`, ...) live in [`crate::models`].

use serde::{Deserialize, Serialize};

use crate::db::repository::PoolStats;
use crate::models::{BookFilter, CategoryId, PageRequest};

/// `?page=&page_size=`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

/// `GET /book?page=&page_size=&category_id=`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BookListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub category_id: Option<CategoryId>,
}

impl BookListQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }

    pub fn filter(&self) -> BookFilter {
        BookFilter {
            category_id: self.category_id,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` when the store answers, `degraded` otherwise
    pub status: String,
    pub version: String,
    pub database: String,
    pub cache: String,
    pub events: String,
    /// Pool counters; only pooled backends report them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}
