//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code. Response bodies are a
/// flat `{"error": "<message>"}` object, which is the contract the admin UI
/// and the desktop agents parse.
///
/// # Error Categories
///
/// - **Workspace errors**: no workspace cookie on a tenant-scoped request
/// - **Authentication errors**: missing/invalid session or bearer key
/// - **Authorization errors**: membership or role checks failed
/// - **Resource errors**: requested resources not found
/// - **Validation errors**: invalid request data
/// - **Database errors**: any sqlx::Error from database operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No workspace cookie present on a request that needs tenant scoping.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("No workspace selected")]
    NoWorkspace,

    /// Session cookie or agent bearer key is missing or invalid.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Unauthorized")]
    Unauthorized,

    /// Caller has no active membership in the resolved workspace,
    /// or an agent touched another company's resources.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Forbidden")]
    Forbidden,

    /// Caller is a member but the endpoint requires a higher role.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Insufficient role")]
    InsufficientRole,

    /// Download token failed validation (expired, consumed, or never issued).
    ///
    /// Returns HTTP 403 Forbidden. Deliberately indistinguishable across
    /// the three cases.
    #[error("invalid_or_expired_token")]
    InvalidDownloadToken,

    /// Requested resource does not exist or is outside the caller's tenant.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("{0}")]
    NotFound(&'static str),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request with details about what was invalid.
    #[error("{0}")]
    InvalidRequest(String),

    /// Database operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Credential hashing or verification failed internally.
    #[error("Credential hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Any other internal failure (e.g., malformed PUBLIC_URL).
    #[error("{0}")]
    Internal(String),
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Status Code Mapping
///
/// - `NoWorkspace`, `InvalidRequest` → 400 Bad Request
/// - `Unauthorized` → 401 Unauthorized
/// - `Forbidden`, `InsufficientRole`, `InvalidDownloadToken` → 403 Forbidden
/// - `NotFound` → 404 Not Found
/// - `Database`, `Hash`, `Internal` → 500 (detail logged, hidden from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NoWorkspace => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden | AppError::InsufficientRole | AppError::InvalidDownloadToken => {
                (StatusCode::FORBIDDEN, self.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            AppError::InvalidRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Database(_) | AppError::Hash(_) | AppError::Internal(_) => {
                // Log the detail server-side, never return it to the client
                tracing::error!("internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn no_workspace_is_400_with_contract_message() {
        let (status, body) = body_json(AppError::NoWorkspace).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "No workspace selected" }));
    }

    #[tokio::test]
    async fn insufficient_role_is_403_with_contract_message() {
        let (status, body) = body_json(AppError::InsufficientRole).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, serde_json::json!({ "error": "Insufficient role" }));
    }

    #[tokio::test]
    async fn unauthorized_is_401() {
        let (status, body) = body_json(AppError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn database_errors_are_hidden_500s() {
        let (status, body) = body_json(AppError::Database(sqlx::Error::PoolClosed)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn not_found_carries_its_message() {
        let (status, body) = body_json(AppError::NotFound("Thread not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Thread not found");
    }
}
