use serde::{Deserialize, Serialize};

use crate::define_row_id;
use crate::validation::{rules, FieldError, Validate};

define_row_id!(CategoryId, "category");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Body of `POST /category/create` and `PUT /category/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCategory {
    pub name: String,
}

impl Validate for NewCategory {
    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        rules::name(errors, "name", &self.name);
    }
}
