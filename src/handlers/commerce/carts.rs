use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, validate_input, MessageResponse},
    services::commerce::cart_service::{AddToCartInput, CartView, UpdateCartItemInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

/// Creates the router for the caller's cart
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/items", post(add_to_cart))
        .route("/items/:id", put(update_cart_item).delete(remove_cart_item))
}

/// Get the caller's cart at current prices
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    summary = "View cart",
    responses(
        (status = 200, description = "Cart contents", body = CartView),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .view(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Add a product to the cart
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    summary = "Add to cart",
    request_body = AddToCartInput,
    responses(
        (status = 201, description = "Added to cart", body = MessageResponse),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    state
        .services
        .cart
        .add_item(user.user_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(MessageResponse::new("Added to cart")))
}

/// Set the quantity of a cart line
#[utoipa::path(
    put,
    path = "/api/v1/cart/items/{id}",
    summary = "Update cart item",
    params(("id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateCartItemInput,
    responses(
        (status = 200, description = "Cart item updated", body = MessageResponse),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    state
        .services
        .cart
        .update_item(user.user_id, item_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MessageResponse::new("Cart updated")))
}

/// Remove a line from the cart
#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{id}",
    summary = "Remove cart item",
    params(("id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Cart item removed", body = MessageResponse),
        (status = 404, description = "Cart item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .cart
        .remove_item(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MessageResponse::new("Removed from cart")))
}
