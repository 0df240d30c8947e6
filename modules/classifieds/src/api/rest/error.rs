use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::rest::dto::{ErrorDetail, ErrorEnvelope, FieldErrorDto};
use crate::domain::error::DomainError;

/// Boundary translator from domain errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

/// Status and envelope for taxonomy errors; `None` for anything else.
pub fn map_domain_error(e: &DomainError) -> Option<(StatusCode, ErrorEnvelope)> {
    let (status, detail) = match e {
        DomainError::ValidationFailed { errors } => (
            StatusCode::BAD_REQUEST,
            ErrorDetail::Fields(errors.iter().cloned().map(FieldErrorDto::from).collect()),
        ),
        DomainError::Conflict { message } => {
            (StatusCode::BAD_REQUEST, ErrorDetail::Message(message.clone()))
        }
        DomainError::NotFound { message } => {
            (StatusCode::NOT_FOUND, ErrorDetail::Message(message.clone()))
        }
        DomainError::Database { .. } => return None,
    };
    Some((status, ErrorEnvelope { error: detail }))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match map_domain_error(&self.0) {
            Some((status, envelope)) => (status, Json(envelope)).into_response(),
            None => {
                // Log the internal error details but don't expose them to the client
                tracing::error!(error = ?self.0, "Unhandled failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
