//! Paired HTML/JSON document references.
//!
//! Author stories and book introductions are rendered from an HTML file and
//! edited through a JSON file stored side by side. Older exports encode the pair
//! as a single `"html, json"` string; request bodies accept either form and
//! responses always use the record.

use serde::{Deserialize, Serialize};

use crate::validation::{rules, FieldError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FilePairInput")]
pub struct FilePair {
    /// Relative path of the rendered HTML document
    pub html: String,
    /// Relative path of the editor JSON document
    pub json: String,
}

impl FilePair {
    pub fn new(html: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            json: json.into(),
        }
    }

    /// Parse the legacy comma-joined representation.
    ///
    /// Returns `None` unless the string holds exactly two non-empty paths.
    pub fn parse_legacy(value: &str) -> Option<Self> {
        let mut parts = value.split(',').map(str::trim);
        let html = parts.next().filter(|p| !p.is_empty())?;
        let json = parts.next().filter(|p| !p.is_empty())?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(html, json))
    }

    pub(crate) fn collect_errors(&self, field: &str, errors: &mut Vec<FieldError>) {
        rules::relative_path(errors, &format!("{}.html", field), &self.html);
        rules::relative_path(errors, &format!("{}.json", field), &self.json);
    }

    /// Rebuild a pair from two nullable columns; half-filled rows read as absent.
    pub fn from_columns(html: Option<String>, json: Option<String>) -> Option<Self> {
        match (html, json) {
            (Some(html), Some(json)) => Some(Self { html, json }),
            _ => None,
        }
    }

    pub fn into_columns(pair: Option<Self>) -> (Option<String>, Option<String>) {
        match pair {
            Some(p) => (Some(p.html), Some(p.json)),
            None => (None, None),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FileRecord {
    html: String,
    json: String,
}

#[derive(Deserialize)]
#[serde(untagged, expecting = "an {html, json} object or an \"html, json\" string")]
enum FilePairInput {
    Record(FileRecord),
    Legacy(String),
}

impl TryFrom<FilePairInput> for FilePair {
    type Error = String;

    fn try_from(input: FilePairInput) -> Result<Self, Self::Error> {
        match input {
            FilePairInput::Record(FileRecord { html, json }) => Ok(Self { html, json }),
            FilePairInput::Legacy(raw) => Self::parse_legacy(&raw)
                .ok_or_else(|| format!("expected \"html, json\", got {:?}", raw)),
        }
    }
}
