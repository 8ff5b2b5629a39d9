use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    services::orders::OrderReceipt,
    AppState,
};
use axum::{extract::State, response::IntoResponse};

/// List the caller's orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "Order history",
    description = "Orders placed by the authenticated user, newest first, with purchase-time prices",
    responses(
        (status = 200, description = "Order history", body = [OrderReceipt],
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_orders(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}
