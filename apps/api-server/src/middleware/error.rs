//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use globe_shared::ErrorResponse;
use std::fmt;

use globe_core::chat::ChatError;
use globe_core::error::{DomainError, RepoError};

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Validation(Vec<String>),
    RateLimited { retry_after: u64, message: String },
    /// The chat agent service failed; the message is shown to the caller.
    Upstream(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Validation(errors) => write!(f, "Validation errors: {:?}", errors),
            AppError::RateLimited { retry_after, .. } => {
                write!(f, "Rate limited, retry after {}s", retry_after)
            }
            AppError::Upstream(msg) => write!(f, "Chat error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::Validation(errors) => ErrorResponse::unprocessable(errors.join(", ")),
            AppError::RateLimited {
                retry_after,
                message,
            } => {
                builder.insert_header((header::RETRY_AFTER, retry_after.to_string()));
                ErrorResponse::too_many_requests(message)
            }
            AppError::Upstream(detail) => {
                tracing::error!(error = %detail, "Chat request failed");
                ErrorResponse::internal_error().with_detail(format!("Chat error: {detail}"))
            }
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        builder.json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { .. } => AppError::NotFound(err.to_string()),
            DomainError::Validation(msg) => AppError::Validation(vec![msg]),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::RateLimited {
                retry_after,
                message,
            } => AppError::RateLimited {
                retry_after,
                message,
            },
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[actix_web::test]
    async fn rate_limit_sets_retry_after() {
        let err = AppError::from(ChatError::RateLimited {
            retry_after: 20,
            message: "Try again in 20 seconds.".into(),
        });
        let response = err.error_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "20");
    }

    #[actix_web::test]
    async fn upstream_detail_is_prefixed() {
        let err = AppError::from(ChatError::Misconfigured("AZURE_MODEL missing".into()));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["detail"], "Chat error: AZURE_MODEL missing");
    }

    #[test]
    fn typed_not_found_message() {
        let err = AppError::from(DomainError::not_found("Blog post", "65f1c2a0b1c2d3e4f5a6b7c8"));
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Blog post not found"));
    }
}
