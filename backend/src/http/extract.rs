//! Request extractors that reject with the JSON error envelope.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::str::FromStr;

use super::error::AppError;
use crate::validation::{decode_body, FieldError, OutputCheck, Validate};

/// JSON body decoded strictly and checked with [`Validate`].
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Rejected(e.status(), e.body_text()))?;
        decode_body(&bytes).map(ValidJson).map_err(AppError::Validation)
    }
}

/// Parse a numeric path segment. Anything unparsable cannot name a row.
pub fn path_id<T: FromStr>(entity: &str, raw: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("{} {} not found", entity, raw)))
}

/// Run the output check and wrap the value for sending.
pub fn checked<T: OutputCheck + Serialize>(value: T) -> Result<Json<T>, AppError> {
    value.verify_output().map_err(AppError::InvalidResponse)?;
    Ok(Json(value))
}

/// [`checked`] with a 201 status.
pub fn created<T: OutputCheck + Serialize>(value: T) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::CREATED, checked(value)?))
}

pub fn query_error(message: impl Into<String>) -> AppError {
    AppError::Validation(vec![FieldError::new("query", message)])
}
