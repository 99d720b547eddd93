//! Book records, listings and the request bodies of the create-book flow.
//!
//! Creating a book is three independent calls: store the info, attach the PDF,
//! link the authors. A later step failing leaves the earlier ones in place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{AuthorId, AuthorSummary, Category, CategoryId, FilePair};
use crate::define_row_id;
use crate::validation::{rules, FieldError, Validate};

define_row_id!(BookId, "book");

/// A stored book without its relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub avatar: Option<String>,
    pub pdf: Option<String>,
    pub published_day: Option<NaiveDate>,
    pub category_id: Option<CategoryId>,
    pub introduce: Option<FilePair>,
    /// Image paths in display order
    pub images: Vec<String>,
}

/// `GET /book/{id}` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub category: Option<Category>,
    pub authors: Vec<AuthorSummary>,
}

/// Menu entry: only books with at least one linked author appear in the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: BookId,
    pub name: String,
    pub avatar: Option<String>,
    pub authors: Vec<AuthorSummary>,
}

/// Minimal book reference embedded in reader lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
    pub id: BookId,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<&Book> for BookRef {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            name: book.name.clone(),
            avatar: book.avatar.clone(),
        }
    }
}

/// Listing filter for `GET /book`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub category_id: Option<CategoryId>,
}

/// Body of `POST /book/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewBook {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub published_day: Option<NaiveDate>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub introduce: Option<FilePair>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewBook {
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            name: self.name.trim().to_string(),
            avatar: self.avatar,
            pdf: None,
            published_day: self.published_day,
            category_id: self.category_id,
            introduce: self.introduce,
            images: self.images,
        }
    }
}

/// Body of `PUT /book/{id}`. Absent fields keep their stored value.
///
/// As with authors, `null` means "leave unchanged" and an all-absent patch
/// is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub published_day: Option<NaiveDate>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub introduce: Option<FilePair>,
    /// Replaces the whole image list when present
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.avatar.is_none()
            && self.published_day.is_none()
            && self.category_id.is_none()
            && self.introduce.is_none()
            && self.images.is_none()
    }

    pub fn apply_to(self, book: &mut Book) {
        if let Some(name) = self.name {
            book.name = name.trim().to_string();
        }
        if let Some(avatar) = self.avatar {
            book.avatar = Some(avatar);
        }
        if let Some(day) = self.published_day {
            book.published_day = Some(day);
        }
        if let Some(category_id) = self.category_id {
            book.category_id = Some(category_id);
        }
        if let Some(introduce) = self.introduce {
            book.introduce = Some(introduce);
        }
        if let Some(images) = self.images {
            book.images = images;
        }
    }
}

/// Body of `PUT /book/{id}/pdf`. Surrounding whitespace is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PdfUpdate {
    pub pdf: String,
}

impl PdfUpdate {
    pub fn path(&self) -> &str {
        self.pdf.trim()
    }
}

/// Body of `PUT /book/{id}/authors`; replaces every author link of the book.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorLinks {
    pub author_ids: Vec<AuthorId>,
}

fn check_images(errors: &mut Vec<FieldError>, images: &[String]) {
    for (idx, image) in images.iter().enumerate() {
        rules::relative_path(errors, &format!("images[{}]", idx), image);
    }
}

fn check_category(errors: &mut Vec<FieldError>, category_id: Option<CategoryId>) {
    if let Some(id) = category_id {
        rules::positive_id(errors, "category_id", id.value());
    }
}

impl Validate for NewBook {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        rules::name(errors, "name", &self.name);
        rules::optional_relative_path(errors, "avatar", self.avatar.as_deref());
        check_category(errors, self.category_id);
        if let Some(introduce) = &self.introduce {
            introduce.collect_errors("introduce", errors);
        }
        check_images(errors, &self.images);
    }
}

impl Validate for BookPatch {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        if self.is_empty() {
            errors.push(FieldError::body(rules::EMPTY_BODY));
            return;
        }
        if let Some(name) = &self.name {
            rules::name(errors, "name", name);
        }
        rules::optional_relative_path(errors, "avatar", self.avatar.as_deref());
        check_category(errors, self.category_id);
        if let Some(introduce) = &self.introduce {
            introduce.collect_errors("introduce", errors);
        }
        if let Some(images) = &self.images {
            check_images(errors, images);
        }
    }
}

/// Re-checks a stored book after a patch was merged into it.
impl Validate for Book {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        rules::name(errors, "name", &self.name);
        check_category(errors, self.category_id);
        check_images(errors, &self.images);
    }
}

impl Validate for PdfUpdate {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        let pdf = self.path();
        rules::relative_path(errors, "pdf", pdf);
        if !pdf.to_lowercase().ends_with(".pdf") {
            errors.push(FieldError::new("pdf", "must reference a .pdf file"));
        }
    }
}

impl Validate for AuthorLinks {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        if self.author_ids.is_empty() {
            errors.push(FieldError::new("author_ids", "must not be empty"));
        }
        let mut seen = HashSet::new();
        for (idx, id) in self.author_ids.iter().enumerate() {
            rules::positive_id(errors, &format!("author_ids[{}]", idx), id.value());
            if !seen.insert(*id) {
                errors.push(FieldError::new(
                    format!("author_ids[{}]", idx),
                    "duplicate author id",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extension_required() {
        let ok = PdfUpdate {
            pdf: "pdf/dune.PDF".to_string(),
        };
        assert!(ok.validate().is_ok());
        let bad = PdfUpdate {
            pdf: "pdf/dune.epub".to_string(),
        };
        assert_eq!(bad.validate().unwrap_err()[0].field, "pdf");
    }

    #[test]
    fn test_pdf_checked_after_trim() {
        let padded = PdfUpdate {
            pdf: "  pdf/dune.pdf \n".to_string(),
        };
        assert!(padded.validate().is_ok());
        assert_eq!(padded.path(), "pdf/dune.pdf");
    }

    #[test]
    fn test_empty_patch_rejected() {
        let errors = BookPatch::default().validate().unwrap_err();
        assert_eq!(errors[0].field, ".");
        let named = BookPatch {
            name: Some("Dune".to_string()),
            ..Default::default()
        };
        assert!(named.validate().is_ok());
    }

    #[test]
    fn test_author_links_reject_duplicates_and_empty() {
        let empty = AuthorLinks { author_ids: vec![] };
        assert!(empty.validate().is_err());

        let dup = AuthorLinks {
            author_ids: vec![AuthorId::new(1), AuthorId::new(1)],
        };
        let errors = dup.validate().unwrap_err();
        assert_eq!(errors[0].field, "author_ids[1]");
    }

    #[test]
    fn test_new_book_image_paths_checked() {
        let book = NewBook {
            name: "Dune".to_string(),
            avatar: None,
            published_day: None,
            category_id: None,
            introduce: None,
            images: vec!["img/1.png".to_string(), "../secret".to_string()],
        };
        let errors = book.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "images[1]");
    }

    #[test]
    fn test_patch_replaces_images() {
        let mut book = NewBook {
            name: "Dune".to_string(),
            avatar: None,
            published_day: None,
            category_id: None,
            introduce: None,
            images: vec!["img/1.png".to_string()],
        }
        .into_book(BookId::new(1));

        BookPatch {
            images: Some(vec![]),
            ..Default::default()
        }
        .apply_to(&mut book);
        assert!(book.images.is_empty());
        assert_eq!(book.name, "Dune");
    }

    #[test]
    fn test_detail_flattens_book_fields() {
        let detail = BookDetail {
            book: NewBook {
                name: "Dune".to_string(),
                avatar: None,
                published_day: NaiveDate::from_ymd_opt(1965, 8, 1),
                category_id: None,
                introduce: None,
                images: vec![],
            }
            .into_book(BookId::new(4)),
            category: None,
            authors: vec![],
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["id"], 4);
        assert_eq!(value["published_day"], "1965-08-01");
    }
}
