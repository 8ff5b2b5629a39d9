pub mod commerce;
pub mod common;
pub mod orders;
pub mod promotions;
pub mod reports;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    commerce::{CartService, CheckoutService, ProductCatalogService, WishlistService},
    orders::OrderHistoryService,
    promotion_admin::PromotionAdminService,
    reports::ReportService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub product_catalog: Arc<ProductCatalogService>,
    pub cart: Arc<CartService>,
    pub wishlist: Arc<WishlistService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderHistoryService>,
    pub promotions: Arc<PromotionAdminService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        Self {
            product_catalog: Arc::new(ProductCatalogService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            cart: Arc::new(CartService::new(db_pool.clone())),
            wishlist: Arc::new(WishlistService::new(db_pool.clone())),
            checkout: Arc::new(CheckoutService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.checkout_max_attempts,
            )),
            orders: Arc::new(OrderHistoryService::new(db_pool.clone())),
            promotions: Arc::new(PromotionAdminService::new(
                db_pool.clone(),
                event_sender,
            )),
            reports: Arc::new(ReportService::new(db_pool, config.low_stock_threshold)),
        }
    }
}
