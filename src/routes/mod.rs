/**
 * Routes Module
 * API route handlers and the shared error taxonomy
 */
use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

pub mod admin;
pub mod auth;
pub mod contact;
pub mod courses;
pub mod health;
pub mod payments;
pub mod testimonials;

/// Error response body shared by every handler
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Success response (for deletes and other bodyless confirmations)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// API error taxonomy. Every handler propagates one of these with `?`;
/// `IntoResponse` maps it to the HTTP status and a JSON error body.
/// Internal errors never leak collaborator detail to the caller.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(String),
    Unavailable(String),
    Internal,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Log a collaborator failure at the call site and surface it as Internal.
pub(crate) fn internal_error(context: &str, err: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", context, err);
    ApiError::Internal
}

/// Fetch the shared pool, or 503 when the database is not configured.
pub(crate) fn db_pool() -> Result<Arc<PgPool>, ApiError> {
    crate::db::get_pool()
        .ok_or_else(|| ApiError::Unavailable("Database not available".to_string()))
}

/// Postgres reports unique-key races through the error text; sqlx does not
/// expose the constraint kind portably at this level.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    let text = err.to_string();
    text.contains("duplicate key") || text.contains("unique constraint")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_taxonomy_status_mapping() {
        assert_eq!(
            status_of(ApiError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::unauthenticated("no token")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(ApiError::forbidden("nope")), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(ApiError::not_found("missing")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(ApiError::conflict("dup")), StatusCode::CONFLICT);
        assert_eq!(
            status_of(ApiError::Unavailable("no db".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ApiError::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response = ApiError::Internal.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
