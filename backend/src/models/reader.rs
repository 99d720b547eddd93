use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::define_row_id;
use crate::validation::{rules, FieldError, Validate};

define_row_id!(ReaderId, "reader");

/// A reader ("client") who owns favorites, read-late and used-read lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reader {
    pub id: ReaderId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /reader/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewReader {
    pub name: String,
    pub email: String,
}

impl NewReader {
    /// Emails compare case-insensitively, so they are stored lowercased.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

impl Validate for NewReader {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        rules::name(errors, "name", &self.name);
        let email = self.email.trim();
        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            }
            None => false,
        };
        if !well_formed || email.contains(char::is_whitespace) {
            errors.push(FieldError::new("email", "must be an email address"));
        }
    }
}
