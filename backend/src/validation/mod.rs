//! Request and response validation.
//!
//! Input bodies are decoded strictly (unknown fields and type mismatches are
//! rejected while decoding) and then checked with [`Validate`]. Response bodies
//! implement [`OutputCheck`] and are checked before they leave the server.
//!
//! Both sides report problems as a list of [`FieldError`]s so the HTTP layer can
//! render one uniform error envelope.

pub mod output;
pub mod rules;

pub use output::OutputCheck;

use serde::{Deserialize, Serialize};

/// A single validation failure attached to a field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field (`"."` for the whole body)
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Error about the body as a whole rather than a specific field.
    pub fn body(message: impl Into<String>) -> Self {
        Self::new(".", message)
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Semantic checks that run after a request body decoded successfully.
pub trait Validate {
    /// Push every problem found into `errors`.
    fn collect_errors(&self, errors: &mut Vec<FieldError>);

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        self.collect_errors(&mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Decode a request body strictly and run its semantic checks.
///
/// Rejects blank bodies, non-object JSON and empty objects before decoding.
/// Decoding errors carry the path of the field that failed.
pub fn decode_body<T>(bytes: &[u8]) -> Result<T, Vec<FieldError>>
where
    T: serde::de::DeserializeOwned + Validate,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(vec![FieldError::body(rules::EMPTY_BODY)]);
    }

    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| vec![FieldError::body(format!("malformed JSON: {}", e))])?;

    match &value {
        serde_json::Value::Object(map) if map.is_empty() => {
            return Err(vec![FieldError::body(rules::EMPTY_BODY)]);
        }
        serde_json::Value::Object(_) => {}
        _ => return Err(vec![FieldError::body("request body must be a JSON object")]),
    }

    let parsed: T = serde_path_to_error::deserialize(value).map_err(|e| {
        let path = e.path().to_string();
        let field = if path.is_empty() { ".".to_string() } else { path };
        vec![FieldError::new(field, e.into_inner().to_string())]
    })?;

    parsed.validate()?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Entry {
        name: String,
        #[serde(default)]
        year: Option<i32>,
    }

    impl Validate for Entry {
        fn collect_errors(&self, errors: &mut Vec<FieldError>) {
            rules::non_blank(errors, "name", &self.name);
            if let Some(year) = self.year {
                if year < 0 {
                    errors.push(FieldError::new("year", "must not be negative"));
                }
            }
        }
    }

    #[test]
    fn test_blank_body_rejected() {
        let err = decode_body::<Entry>(b"   ").unwrap_err();
        assert_eq!(err, vec![FieldError::body(rules::EMPTY_BODY)]);
    }

    #[test]
    fn test_empty_object_rejected() {
        let err = decode_body::<Entry>(b"{}").unwrap_err();
        assert_eq!(err[0].message, rules::EMPTY_BODY);
    }

    #[test]
    fn test_array_rejected() {
        let err = decode_body::<Entry>(b"[1,2]").unwrap_err();
        assert_eq!(err[0].field, ".");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = decode_body::<Entry>(br#"{"name":"x","colour":"red"}"#).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err[0].message.contains("unknown field"));
    }

    #[test]
    fn test_type_mismatch_reports_path() {
        let err = decode_body::<Entry>(br#"{"name":"x","year":"soon"}"#).unwrap_err();
        assert_eq!(err[0].field, "year");
    }

    #[test]
    fn test_semantic_errors_are_collected() {
        let err = decode_body::<Entry>(br#"{"name":"  ","year":-3}"#).unwrap_err();
        let fields: Vec<&str> = err.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "year"]);
    }

    #[test]
    fn test_valid_body_decodes() {
        let entry = decode_body::<Entry>(br#"{"name":"Dune","year":1965}"#).unwrap();
        assert_eq!(entry.name, "Dune");
        assert_eq!(entry.year, Some(1965));
    }
}
