use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, MessageResponse},
    services::promotion_admin::{CreatePromoRequest, PromoSummary, UpdatePromoRequest},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromoCreatedResponse {
    pub message: String,
    pub code: String,
}

/// Creates the router for promo administration; every route requires a manager
pub fn promo_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_promos).post(create_promo))
        .route("/:id", put(update_promo).delete(delete_promo))
}

/// Create a promo code
#[utoipa::path(
    post,
    path = "/api/v1/promo",
    summary = "Create promo code",
    request_body = CreatePromoRequest,
    responses(
        (status = 201, description = "Promo code created", body = PromoCreatedResponse),
        (status = 400, description = "Missing or invalid field", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a manager", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "promotions"
)]
pub async fn create_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePromoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let promo = state
        .services
        .promotions
        .create(&user, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(PromoCreatedResponse {
        message: "Promo code created".to_string(),
        code: promo.code,
    }))
}

/// List promo codes
#[utoipa::path(
    get,
    path = "/api/v1/promo",
    summary = "List promo codes",
    responses(
        (status = 200, description = "Promo codes, newest first", body = [PromoSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a manager", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "promotions"
)]
pub async fn list_promos(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let promos = state
        .services
        .promotions
        .list(&user)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(promos))
}

/// Update a promo code; omitted fields are left unchanged
#[utoipa::path(
    put,
    path = "/api/v1/promo/{id}",
    summary = "Update promo code",
    params(("id" = Uuid, Path, description = "Promo code id")),
    request_body = UpdatePromoRequest,
    responses(
        (status = 200, description = "Promo updated", body = MessageResponse),
        (status = 400, description = "Invalid field", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a manager", body = crate::errors::ErrorResponse),
        (status = 404, description = "Promo code not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "promotions"
)]
pub async fn update_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePromoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .promotions
        .update(&user, id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MessageResponse::new(
        "Promo updated successfully",
    )))
}

/// Delete a promo code
#[utoipa::path(
    delete,
    path = "/api/v1/promo/{id}",
    summary = "Delete promo code",
    params(("id" = Uuid, Path, description = "Promo code id")),
    responses(
        (status = 200, description = "Promo deleted", body = MessageResponse),
        (status = 403, description = "Caller is not a manager", body = crate::errors::ErrorResponse),
        (status = 404, description = "Promo code not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "promotions"
)]
pub async fn delete_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .promotions
        .delete(&user, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MessageResponse::new("Promo deleted")))
}
