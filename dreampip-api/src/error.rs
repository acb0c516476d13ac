/// Error handling for the API server
///
/// Handlers return `Result<T, ApiError>`; `ApiError` renders as a JSON body
/// `{ "error", "message", "details"? }` with a matching status code.
///
/// # Example
///
/// ```
/// use dreampip_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Task list not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dreampip_shared::auth::context::AuthError;
use dreampip_shared::auth::jwt::JwtError;
use dreampip_shared::budget::{BudgetError, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Allocation would take an owner past 100% (409)
    BudgetExceeded {
        user_id: Uuid,
        requested: f64,
        current: f64,
    },

    /// Unprocessable entity (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "budget_exceeded")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::BudgetExceeded {
                user_id,
                requested,
                current,
            } => write!(
                f,
                "Budget exceeded for owner {}: {}% requested with {}% already allocated",
                user_id, requested, current
            ),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            err @ ApiError::BudgetExceeded { .. } => {
                (StatusCode::CONFLICT, "budget_exceeded", err.to_string(), None)
            }
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Logged, never shown to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<BudgetError> for ApiError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::AllocationExceeded {
                user_id,
                requested,
                current,
            } => ApiError::BudgetExceeded {
                user_id,
                requested,
                current,
            },
            BudgetError::InvalidPercentage(value) => ApiError::invalid_field(
                "budget_percentage",
                format!("Budget percentage must be between 0 and 100, got {}", value),
            ),
            BudgetError::InvalidSettings(e) => ApiError::invalid_field("settings", e.to_string()),
            BudgetError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            BudgetError::Store(StoreError::Database(e)) => ApiError::from(e),
            BudgetError::Store(StoreError::Unavailable(msg)) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                ApiError::ServiceUnavailable("Database unavailable".to_string())
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing authorization header".to_string())
            }
            AuthError::InvalidFormat => ApiError::BadRequest("Expected Bearer token".to_string()),
            AuthError::InvalidToken(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;

    #[derive(Debug)]
    struct ConstraintError(&'static str);

    impl fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violates constraint {}", self.0)
        }
    }

    impl std::error::Error for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23514"))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.0)
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::CheckViolation
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task list not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task list not found");
    }

    #[test]
    fn test_budget_errors_map_to_status() {
        let exceeded = ApiError::from(BudgetError::AllocationExceeded {
            user_id: Uuid::nil(),
            requested: 20.0,
            current: 85.0,
        });
        assert_eq!(exceeded.into_response().status(), StatusCode::CONFLICT);

        let invalid = ApiError::from(BudgetError::InvalidPercentage(120.0));
        assert_eq!(invalid.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing = ApiError::from(BudgetError::NotFound("Task list".to_string()));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let down = ApiError::from(BudgetError::Store(StoreError::Unavailable("down".to_string())));
        assert_eq!(down.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let db = ApiError::from(BudgetError::Store(StoreError::Database(sqlx::Error::PoolTimedOut)));
        assert_eq!(db.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_auth_errors_map_to_status() {
        let missing = ApiError::from(AuthError::MissingCredentials);
        assert_eq!(missing.into_response().status(), StatusCode::UNAUTHORIZED);

        let malformed = ApiError::from(AuthError::InvalidFormat);
        assert_eq!(malformed.into_response().status(), StatusCode::BAD_REQUEST);

        let expired = ApiError::from(AuthError::InvalidToken(JwtError::Expired));
        assert_eq!(expired.to_string(), "Unauthorized: Token expired");
    }

    #[tokio::test]
    async fn test_budget_exceeded_body_names_owner() {
        let owner = Uuid::new_v4();
        let err = ApiError::from(BudgetError::AllocationExceeded {
            user_id: owner,
            requested: 30.0,
            current: 80.0,
        });
        assert!(matches!(err, ApiError::BudgetExceeded { user_id, .. } if user_id == owner));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["error"], "budget_exceeded");
        assert_eq!(
            body["message"],
            format!(
                "Budget exceeded for owner {}: 30% requested with 80% already allocated",
                owner
            )
        );
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_constraint_violation_maps_to_conflict() {
        let err = ApiError::from(sqlx::Error::Database(Box::new(ConstraintError(
            "task_lists_budget_percentage_check",
        ))));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["error"], "conflict");
        assert_eq!(
            body["message"],
            "Constraint violation: task_lists_budget_percentage_check"
        );
    }

    #[test]
    fn test_validation_error() {
        let err = ApiError::invalid_field("budget_percentage", "out of range");
        assert_eq!(err.to_string(), "Validation failed: 1 errors");
    }
}
