//! Grocery API library
//!
//! Catalog, cart, wishlist, checkout and promo administration for a single
//! grocery store, served over HTTP with axum and persisted with sea-orm.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;

use auth::AuthRouterExt;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Extension, Json, Router,
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: Arc<events::EventSender>,
    pub auth: Arc<auth::AuthService>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let db = Arc::new(db);
        let event_sender = Arc::new(event_sender);
        let auth = Arc::new(auth::AuthService::new(auth::AuthConfig::from(&config)));
        let services = handlers::AppServices::new(db.clone(), event_sender.clone(), &config);

        Self {
            db,
            config: Arc::new(config),
            event_sender,
            auth,
            services,
        }
    }
}

/// Versioned API routes, nested under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    // Catalog reads are public; products_routes gates its own writes.
    let storefront = Router::new()
        .nest("/cart", handlers::commerce::carts_routes())
        .nest("/wishlist", handlers::commerce::wishlist_routes())
        .nest("/checkout", handlers::commerce::checkout_routes())
        .route("/orders", get(handlers::orders::list_orders))
        .with_auth();

    let manager = Router::new()
        .nest("/promo", handlers::promotions::promo_routes())
        .nest("/reports", handlers::reports::reports_routes())
        .with_auth();

    Router::new()
        .nest("/products", handlers::commerce::products_routes())
        .merge(storefront)
        .merge(manager)
}

/// Builds the complete HTTP application: health, OpenAPI document and the
/// v1 API, wrapped in the shared middleware stack.
pub fn build_router(state: AppState) -> Router {
    let cors_layer = cors_layer(&state.config);
    let auth_service = state.auth.clone();

    let api = Router::new()
        .nest("/api/v1", api_v1_routes())
        .with_state(state.clone());

    Router::new()
        .route("/", get(|| async { "grocery-api up" }))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDocV1::openapi()) }),
        )
        .nest("/health", health::health_routes(state.db.clone()))
        .merge(api)
        // HTTP access log
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        // Auth middleware reads the service from request extensions
        .layer(Extension(auth_service))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        let layer = CorsLayer::new().allow_origin(origins);
        if cfg.cors_allow_credentials {
            // Credentialed CORS cannot use wildcards.
            layer
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static(middleware_helpers::request_id::REQUEST_ID_HEADER),
                ])
                .allow_credentials(true)
        } else {
            layer.allow_methods(Any).allow_headers(Any)
        }
    } else if cfg.should_allow_permissive_cors() {
        info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        warn!("No CORS origins configured; cross-origin requests will be rejected");
        CorsLayer::new()
    }
}
