//! Reusable field rules shared by request types.

use super::FieldError;

pub const EMPTY_BODY: &str = "request body must not be empty";

/// Longest name accepted for any catalog entity.
pub const MAX_NAME_LEN: usize = 255;

/// Longest stored relative file path.
pub const MAX_PATH_LEN: usize = 512;

pub fn non_blank(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be blank"));
    }
}

pub fn name(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    non_blank(errors, field, value);
    if value.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} characters", MAX_NAME_LEN),
        ));
    }
}

/// Relative path into one of the static trees.
///
/// Absolute paths and parent-directory segments are refused so a stored path can
/// never point outside the served directory.
pub fn relative_path(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be blank"));
        return;
    }
    if value.len() > MAX_PATH_LEN {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} bytes", MAX_PATH_LEN),
        ));
    }
    if value.starts_with('/') || value.starts_with('\\') {
        errors.push(FieldError::new(field, "must be a relative path"));
    }
    if value.split(['/', '\\']).any(|segment| segment == "..") {
        errors.push(FieldError::new(field, "must not contain '..' segments"));
    }
}

pub fn optional_relative_path(errors: &mut Vec<FieldError>, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        relative_path(errors, field, value);
    }
}

pub fn positive_id(errors: &mut Vec<FieldError>, field: &str, value: i64) {
    if value <= 0 {
        errors.push(FieldError::new(field, "must be a positive id"));
    }
}
