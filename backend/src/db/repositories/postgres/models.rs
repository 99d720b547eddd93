use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{
    authors, book_authors, book_images, books, categories, reader_list_entries, readers,
};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    Author, AuthorId, AuthorSummary, Book, BookId, BookRef, Category, CategoryId, FilePair,
    Reader, ReaderId,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = authors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // created_at only read by SQL ordering
pub struct AuthorRow {
    pub id: i64,
    pub name: String,
    pub sex: String,
    pub avatar: Option<String>,
    pub birth_year: i32,
    pub death_year: Option<i32>,
    pub story_html: Option<String>,
    pub story_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuthorRow {
    pub fn into_author(self) -> RepositoryResult<Author> {
        let sex = self.sex.parse().map_err(|e: String| {
            RepositoryError::internal(format!("author {} has invalid sex column: {}", self.id, e))
        })?;
        Ok(Author {
            id: AuthorId::new(self.id),
            name: self.name,
            sex,
            avatar: self.avatar,
            birth_year: self.birth_year,
            death_year: self.death_year,
            story: FilePair::from_columns(self.story_html, self.story_json),
        })
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = authors)]
#[diesel(treat_none_as_null = true)]
pub struct AuthorChanges {
    pub name: String,
    pub sex: String,
    pub avatar: Option<String>,
    pub birth_year: i32,
    pub death_year: Option<i32>,
    pub story_html: Option<String>,
    pub story_json: Option<String>,
}

impl AuthorChanges {
    pub fn new(
        name: &str,
        sex: crate::models::Sex,
        avatar: Option<&String>,
        birth_year: i32,
        death_year: Option<i32>,
        story: Option<&FilePair>,
    ) -> Self {
        let (story_html, story_json) = FilePair::into_columns(story.cloned());
        Self {
            name: name.trim().to_string(),
            sex: sex.as_str().to_string(),
            avatar: avatar.cloned(),
            birth_year,
            death_year,
            story_html,
            story_json,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = authors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthorSummaryRow {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<AuthorSummaryRow> for AuthorSummary {
    fn from(row: AuthorSummaryRow) -> Self {
        Self {
            id: AuthorId::new(row.id),
            name: row.name,
            avatar: row.avatar,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = categories)]
pub struct CategoryChanges {
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // created_at only read by SQL ordering
pub struct BookRow {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
    pub pdf: Option<String>,
    pub published_day: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub introduce_html: Option<String>,
    pub introduce_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookRow {
    pub fn into_book(self, images: Vec<String>) -> Book {
        Book {
            id: BookId::new(self.id),
            name: self.name,
            avatar: self.avatar,
            pdf: self.pdf,
            published_day: self.published_day,
            category_id: self.category_id.map(CategoryId::new),
            introduce: FilePair::from_columns(self.introduce_html, self.introduce_json),
            images,
        }
    }

    pub fn to_ref(&self) -> BookRef {
        BookRef {
            id: BookId::new(self.id),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = books)]
#[diesel(treat_none_as_null = true)]
pub struct BookChanges {
    pub name: String,
    pub avatar: Option<String>,
    pub published_day: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub introduce_html: Option<String>,
    pub introduce_json: Option<String>,
}

impl BookChanges {
    pub fn new(
        name: &str,
        avatar: Option<&String>,
        published_day: Option<NaiveDate>,
        category_id: Option<CategoryId>,
        introduce: Option<&FilePair>,
    ) -> Self {
        let (introduce_html, introduce_json) = FilePair::into_columns(introduce.cloned());
        Self {
            name: name.trim().to_string(),
            avatar: avatar.cloned(),
            published_day,
            category_id: category_id.map(|c| c.value()),
            introduce_html,
            introduce_json,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = book_images)]
pub struct NewBookImageRow {
    pub book_id: i64,
    pub position: i32,
    pub path: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = book_authors)]
pub struct BookAuthorRow {
    pub book_id: i64,
    pub author_id: i64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = readers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReaderRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReaderRow> for Reader {
    fn from(row: ReaderRow) -> Self {
        Self {
            id: ReaderId::new(row.id),
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = readers)]
pub struct NewReaderRow {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reader_list_entries)]
pub struct NewListEntryRow {
    pub reader_id: i64,
    pub list_kind: String,
    pub book_id: i64,
}
