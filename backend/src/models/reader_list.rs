//! Per-reader book lists.
//!
//! Each reader has three independent lists. An entry is the triple
//! (reader, book, kind) plus the time it was added; the store rejects duplicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{BookId, BookRef, ReaderId};
use crate::validation::{rules, FieldError, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListKind {
    Favorites,
    ReadLate,
    UsedRead,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [ListKind::Favorites, ListKind::ReadLate, ListKind::UsedRead];

    /// Path segment and stored discriminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Favorites => "favorites",
            ListKind::ReadLate => "read-late",
            ListKind::UsedRead => "used-read",
        }
    }

    /// Name of the event (and pub/sub channel) published when this list changes.
    pub fn event_name(&self) -> &'static str {
        match self {
            ListKind::Favorites => "favorite_books",
            ListKind::ReadLate => "read_late",
            ListKind::UsedRead => "used_read",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown list kind: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub book: BookRef,
    pub added_at: DateTime<Utc>,
}

/// A reader's complete list of one kind, most recently added first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderList {
    pub reader_id: ReaderId,
    pub kind: ListKind,
    pub books: Vec<ListEntry>,
}

/// Body of `POST /reader/{id}/{kind}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListAddition {
    pub book_id: BookId,
}

impl Validate for ListAddition {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        rules::positive_id(errors, "book_id", self.book_id.value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrips_through_path_segment() {
        for kind in ListKind::ALL {
            assert_eq!(kind.as_str().parse::<ListKind>().unwrap(), kind);
        }
        assert!("wishlist".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_kind_serde_matches_path_segment() {
        let json = serde_json::to_string(&ListKind::ReadLate).unwrap();
        assert_eq!(json, "\"read-late\"");
    }

    #[test]
    fn test_event_names() {
        assert_eq!(ListKind::Favorites.event_name(), "favorite_books");
        assert_eq!(ListKind::UsedRead.event_name(), "used_read");
    }
}
