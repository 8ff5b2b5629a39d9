use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::middleware_helpers::request_id::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint outside the auth layer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not enough stock for Oat Milk",
    "code": "insufficient_stock",
    "details": null,
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Human-readable error description
    pub error: String,
    /// Stable machine-readable error kind
    pub code: String,
    /// Additional error details (field-level validation output)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error occurred
    pub timestamp: String,
}

/// Reasons a promo code cannot be applied to a checkout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum PromoError {
    #[error("Invalid promo code")]
    InvalidCode,

    #[error("Promo code expired")]
    Expired,

    #[error("Minimum order should be {minimum}")]
    BelowMinimum { minimum: Decimal },

    #[error("Promo already used")]
    AlreadyUsed,
}

impl PromoError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCode => "promo_invalid",
            Self::Expired => "promo_expired",
            Self::BelowMinimum { .. } => "promo_below_minimum",
            Self::AlreadyUsed => "promo_already_used",
        }
    }
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0} is required")]
    MissingField(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("No items in cart")]
    NoItems,

    #[error("Not enough stock for {0}")]
    InsufficientStock(String),

    #[error(transparent)]
    Promo(#[from] PromoError),

    /// The checkout transaction could not be made durable.
    #[error("Commit failure: {0}")]
    CommitFailed(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::EmptyCart | Self::NoItems | Self::InsufficientStock(_) | Self::Promo(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::DatabaseError(_)
            | Self::CommitFailed(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error kind used in response bodies and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) => "validation_error",
            Self::MissingField(_) => "missing_field",
            Self::Unauthorized(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::EmptyCart => "empty_cart",
            Self::NoItems => "no_items",
            Self::InsufficientStock(_) => "insufficient_stock",
            Self::Promo(err) => err.code(),
            Self::CommitFailed(_) => "commit_failed",
            Self::InternalError(_) | Self::Other(_) => "internal_error",
        }
    }

    /// True for rejections the shopper can act on (stock, cart state, promo eligibility).
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::EmptyCart | Self::NoItems | Self::InsufficientStock(_) | Self::Promo(_)
        )
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::CommitFailed(_) => "Order could not be committed".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

fn error_body(status: StatusCode, code: &str, message: String, details: Option<String>) -> Response {
    let body = ErrorResponse {
        error: message,
        code: code.to_string(),
        details,
        request_id: current_request_id(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        error_body(self.status_code(), self.code(), self.response_message(), None)
    }
}

/// API Error type for HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        details: Option<String>,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceError(service_error) => service_error.into_response(),
            ApiError::ValidationError(msg) => {
                error_body(StatusCode::BAD_REQUEST, "validation_error", msg, None)
            }
            ApiError::BadRequest { message, details } => {
                error_body(StatusCode::BAD_REQUEST, "bad_request", message, details)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware_helpers::request_id::{scope_request_id, RequestId};
    use axum::body::to_bytes;
    use rust_decimal_macros::dec;
    use sea_orm::error::DbErr;

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response = scope_request_id(RequestId::new("req-123"), async {
            ServiceError::NotFound("Promo code not found".into()).into_response()
        })
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
        assert_eq!(payload.error, "Promo code not found");
        assert_eq!(payload.code, "not_found");
    }

    #[tokio::test]
    async fn promo_failure_carries_minimum_in_body() {
        let err = ServiceError::from(PromoError::BelowMinimum {
            minimum: dec!(50.00),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.error, "Minimum order should be 50.00");
        assert_eq!(payload.code, "promo_below_minimum");
    }

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::MissingField("code".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::InsufficientStock("Apples".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Promo(PromoError::AlreadyUsed).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::CommitFailed("disk full".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn business_rule_messages_are_user_facing() {
        assert_eq!(
            ServiceError::InsufficientStock("Apples".into()).response_message(),
            "Not enough stock for Apples"
        );
        assert_eq!(ServiceError::EmptyCart.response_message(), "Cart is empty");
        assert_eq!(ServiceError::NoItems.response_message(), "No items in cart");
        assert_eq!(
            ServiceError::MissingField("expiry_date".into()).response_message(),
            "expiry_date is required"
        );
        assert!(ServiceError::Promo(PromoError::Expired).is_business_rule());
        assert!(!ServiceError::NotFound("x".into()).is_business_rule());
    }

    #[test]
    fn internal_failures_hide_details() {
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("secret dsn".into())).response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::CommitFailed("connection reset".into()).response_message(),
            "Order could not be committed"
        );
        assert_eq!(
            ServiceError::InternalError("stack".into()).response_message(),
            "Internal server error"
        );
    }
}
