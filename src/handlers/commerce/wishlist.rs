use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, MessageResponse},
    services::commerce::wishlist_service::{AddToWishlistInput, WishlistEntry},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get},
    Router,
};
use uuid::Uuid;

pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist).post(add_to_wishlist))
        .route("/:product_id", delete(remove_from_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/v1/wishlist",
    summary = "View wishlist",
    responses(
        (status = 200, description = "Wishlist entries, newest first", body = [WishlistEntry]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .services
        .wishlist
        .list(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(entries))
}

#[utoipa::path(
    post,
    path = "/api/v1/wishlist",
    summary = "Add to wishlist",
    request_body = AddToWishlistInput,
    responses(
        (status = 201, description = "Added to wishlist", body = MessageResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToWishlistInput>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .wishlist
        .add(user.user_id, payload.product_id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(MessageResponse::new("Added to wishlist")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/wishlist/{product_id}",
    summary = "Remove from wishlist",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Removed from wishlist", body = MessageResponse),
        (status = 404, description = "Product not in wishlist", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .wishlist
        .remove(user.user_id, product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MessageResponse::new("Removed from wishlist")))
}
