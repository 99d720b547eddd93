//! Author records and the request bodies that create or change them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::FilePair;
use crate::define_row_id;
use crate::validation::{rules, FieldError, Validate};

define_row_id!(AuthorId, "author");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(format!("Unknown sex: {}", s)),
        }
    }
}

/// A stored author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub sex: Sex,
    pub avatar: Option<String>,
    pub birth_year: i32,
    /// `None` while the author is alive
    pub death_year: Option<i32>,
    pub story: Option<FilePair>,
}

/// Lightweight author entry used by menus and book listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: AuthorId,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<&Author> for AuthorSummary {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
        }
    }
}

/// Body of `POST /author/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAuthor {
    pub name: String,
    pub sex: Sex,
    #[serde(default)]
    pub avatar: Option<String>,
    pub birth_year: i32,
    #[serde(default)]
    pub death_year: Option<i32>,
    #[serde(default)]
    pub story: Option<FilePair>,
}

impl NewAuthor {
    pub fn into_author(self, id: AuthorId) -> Author {
        Author {
            id,
            name: self.name.trim().to_string(),
            sex: self.sex,
            avatar: self.avatar,
            birth_year: self.birth_year,
            death_year: self.death_year,
            story: self.story,
        }
    }
}

/// Body of `PUT /author/{id}`. Absent fields keep their stored value.
///
/// `null` reads the same as an absent field, so a patch never clears an
/// optional column. At least one field must carry a value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
    #[serde(default)]
    pub story: Option<FilePair>,
}

impl AuthorPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sex.is_none()
            && self.avatar.is_none()
            && self.birth_year.is_none()
            && self.death_year.is_none()
            && self.story.is_none()
    }

    pub fn apply_to(self, author: &mut Author) {
        if let Some(name) = self.name {
            author.name = name.trim().to_string();
        }
        if let Some(sex) = self.sex {
            author.sex = sex;
        }
        if let Some(avatar) = self.avatar {
            author.avatar = Some(avatar);
        }
        if let Some(birth_year) = self.birth_year {
            author.birth_year = birth_year;
        }
        if let Some(death_year) = self.death_year {
            author.death_year = Some(death_year);
        }
        if let Some(story) = self.story {
            author.story = Some(story);
        }
    }
}

/// Birth must precede death. Checked on input only; stored rows are trusted.
pub(crate) fn check_lifespan(errors: &mut Vec<FieldError>, birth_year: i32, death_year: Option<i32>) {
    if let Some(death_year) = death_year {
        if birth_year >= death_year {
            errors.push(FieldError::new(
                "death_year",
                "must be greater than birth_year",
            ));
        }
    }
}

impl Validate for NewAuthor {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        rules::name(errors, "name", &self.name);
        rules::optional_relative_path(errors, "avatar", self.avatar.as_deref());
        check_lifespan(errors, self.birth_year, self.death_year);
        if let Some(story) = &self.story {
            story.collect_errors("story", errors);
        }
    }
}

impl Validate for AuthorPatch {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        if self.is_empty() {
            errors.push(FieldError::body(rules::EMPTY_BODY));
            return;
        }
        if let Some(name) = &self.name {
            rules::name(errors, "name", name);
        }
        rules::optional_relative_path(errors, "avatar", self.avatar.as_deref());
        if let Some(birth_year) = self.birth_year {
            check_lifespan(errors, birth_year, self.death_year);
        }
        if let Some(story) = &self.story {
            story.collect_errors("story", errors);
        }
    }
}

impl Validate for Author {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        rules::name(errors, "name", &self.name);
        check_lifespan(errors, self.birth_year, self.death_year);
    }
}
