//! Structural checks applied to response bodies.
//!
//! A failing check means the server is about to send something malformed; the
//! HTTP layer refuses to send it and answers with a generic 400 instead.

use std::collections::HashSet;

use super::FieldError;
use crate::models::{
    Author, AuthorSummary, Book, BookDetail, BookSummary, Category, Page, Reader, ReaderList,
};

pub trait OutputCheck {
    fn check_output(&self, errors: &mut Vec<FieldError>);

    fn verify_output(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        self.check_output(&mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl<T: OutputCheck> OutputCheck for Vec<T> {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        for item in self {
            item.check_output(errors);
        }
    }
}

fn require_id(errors: &mut Vec<FieldError>, field: &str, assigned: bool) {
    if !assigned {
        errors.push(FieldError::new(field, "missing store id"));
    }
}

fn require_name(errors: &mut Vec<FieldError>, field: &str, name: &str) {
    if name.trim().is_empty() {
        errors.push(FieldError::new(field, "empty name"));
    }
}

impl OutputCheck for Author {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        require_id(errors, "id", self.id.is_assigned());
        require_name(errors, "name", &self.name);
        if let Some(death) = self.death_year {
            if death <= self.birth_year {
                errors.push(FieldError::new("death_year", "not after birth_year"));
            }
        }
    }
}

impl OutputCheck for AuthorSummary {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        require_id(errors, "id", self.id.is_assigned());
        require_name(errors, "name", &self.name);
    }
}

impl OutputCheck for Category {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        require_id(errors, "id", self.id.is_assigned());
        require_name(errors, "name", &self.name);
    }
}

impl OutputCheck for Book {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        require_id(errors, "id", self.id.is_assigned());
        require_name(errors, "name", &self.name);
    }
}

impl OutputCheck for BookSummary {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        require_id(errors, "id", self.id.is_assigned());
        require_name(errors, "name", &self.name);
        if self.authors.is_empty() {
            errors.push(FieldError::new("authors", "menu entry without authors"));
        }
    }
}

impl OutputCheck for BookDetail {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        self.book.check_output(errors);
        let mut seen = HashSet::new();
        for author in &self.authors {
            if !seen.insert(author.id) {
                errors.push(FieldError::new("authors", "duplicate author"));
            }
        }
        if let Some(category) = &self.category {
            if Some(category.id) != self.book.category_id {
                errors.push(FieldError::new("category", "does not match category_id"));
            }
        }
    }
}

impl OutputCheck for Reader {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        require_id(errors, "id", self.id.is_assigned());
        require_name(errors, "name", &self.name);
        if !self.email.contains('@') {
            errors.push(FieldError::new("email", "not an address"));
        }
    }
}

impl OutputCheck for ReaderList {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        require_id(errors, "reader_id", self.reader_id.is_assigned());
        let mut seen = HashSet::new();
        for entry in &self.books {
            if !seen.insert(entry.book.id) {
                errors.push(FieldError::new("books", "duplicate book in list"));
            }
        }
    }
}

impl<T: OutputCheck> OutputCheck for Page<T> {
    fn check_output(&self, errors: &mut Vec<FieldError>) {
        if self.page == 0 || self.page_size == 0 {
            errors.push(FieldError::new("page", "page and page_size start at 1"));
        }
        if self.items.len() > self.page_size as usize {
            errors.push(FieldError::new("items", "more items than page_size"));
        }
        if (self.items.len() as u64) > self.total {
            errors.push(FieldError::new("total", "smaller than item count"));
        }
        self.items.check_output(errors);
    }
}
