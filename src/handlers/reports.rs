use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    services::reports::{LowStockQuery, LowStockRow, SalesReportQuery, SalesReportRow},
    AppState,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn reports_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sales_report))
        .route("/low-stock", get(low_stock_report))
}

/// Units sold per product
#[utoipa::path(
    get,
    path = "/api/v1/reports/sales",
    summary = "Sales report",
    params(SalesReportQuery),
    responses(
        (status = 200, description = "Per-product sales", body = [SalesReportRow]),
        (status = 403, description = "Caller is not a manager", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "reports"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SalesReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .reports
        .sales_report(&user, query)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(rows))
}

/// Products running low on stock
#[utoipa::path(
    get,
    path = "/api/v1/reports/low-stock",
    summary = "Low stock report",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Products below the stock threshold", body = [LowStockRow]),
        (status = 403, description = "Caller is not a manager", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "reports"
)]
pub async fn low_stock_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .reports
        .low_stock(&user, query)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(rows))
}
