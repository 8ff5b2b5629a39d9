use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{created_response, map_service_error},
    services::orders::OrderReceipt,
    AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", post(checkout))
}

/// Optional checkout body; an empty body means no promo code
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub promo_code: Option<String>,
}

impl CheckoutRequest {
    /// Parses the raw body. An empty or whitespace-only body is `Default`.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::ValidationError(format!("Invalid checkout body: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub message: String,
    #[serde(flatten)]
    pub receipt: OrderReceipt,
}

/// Check out the caller's cart
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    summary = "Checkout",
    description = "Converts the caller's cart into an order, reserving stock and applying at most one promo code",
    request_body(content = Option<CheckoutRequest>, description = "Optional promo code"),
    responses(
        (status = 201, description = "Order placed", body = CheckoutResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Empty cart, insufficient stock or promo rejected", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Commit failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = CheckoutRequest::from_body(&body)?;

    let receipt = state
        .services
        .checkout
        .checkout(user.user_id, request.promo_code.as_deref())
        .await
        .map_err(map_service_error)?;

    Ok(created_response(CheckoutResponse {
        message: "Checkout successful".to_string(),
        receipt,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_means_no_promo() {
        assert!(CheckoutRequest::from_body(b"").unwrap().promo_code.is_none());
        assert!(CheckoutRequest::from_body(b"  \n").unwrap().promo_code.is_none());
    }

    #[test]
    fn promo_code_is_read_from_json() {
        let req = CheckoutRequest::from_body(br#"{"promo_code":"SAVE10"}"#).unwrap();
        assert_eq!(req.promo_code.as_deref(), Some("SAVE10"));
    }

    #[test]
    fn malformed_body_is_a_validation_error() {
        assert!(matches!(
            CheckoutRequest::from_body(b"{not json"),
            Err(ApiError::ValidationError(_))
        ));
    }
}
