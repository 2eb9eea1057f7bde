/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`, which converts into an HTTP
/// status code and a JSON body:
///
/// ```json
/// { "error": "conflict", "message": "Event is sold out" }
/// ```
///
/// Clients show `message` verbatim.
///
/// # Example
///
/// ```
/// use encore_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(found: bool) -> ApiResult<Json<serde_json::Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Event not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use encore_shared::{
    auth::{jwt::JwtError, password::PasswordError},
    WorkflowError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::DuplicateEmail;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicate email, sold out, contract already answered
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Converts `validator` errors into a 422 with one detail per failure
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(details)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => {
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Request validation failed".to_string());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_error",
                    message,
                    Some(errors),
                )
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert workflow rule violations to API errors
impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::Validation(_) => ApiError::BadRequest(message),
            WorkflowError::Forbidden(_) => ApiError::Forbidden(message),
            WorkflowError::NotFound(_) => ApiError::NotFound(message),
            WorkflowError::ContractNotAccepted(_) => ApiError::BadRequest(message),
            WorkflowError::InvalidTransition { .. }
            | WorkflowError::ContractAlreadyLinked { .. }
            | WorkflowError::SoldOut
            | WorkflowError::InsufficientTickets { .. } => ApiError::Conflict(message),
        }
    }
}

impl From<DuplicateEmail> for ApiError {
    fn from(err: DuplicateEmail) -> Self {
        ApiError::Conflict(err.to_string())
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_shared::models::ContractStatus;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_workflow_error_status_codes() {
        let cases = [
            (WorkflowError::SoldOut, StatusCode::CONFLICT),
            (
                WorkflowError::InsufficientTickets {
                    requested: 2,
                    available: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                WorkflowError::InvalidTransition {
                    from: ContractStatus::Accepted,
                    to: ContractStatus::Rejected,
                },
                StatusCode::CONFLICT,
            ),
            (
                WorkflowError::ContractNotAccepted(ContractStatus::Pending),
                StatusCode::BAD_REQUEST,
            ),
            (
                WorkflowError::Forbidden("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                WorkflowError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                WorkflowError::NotFound("event".to_string()),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password must be at least 6 characters".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
