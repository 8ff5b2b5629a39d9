use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Grocery API",
        version = "1.0.0",
        description = r#"
# Grocery Checkout API

Catalog, cart, wishlist and checkout for a single grocery store, with
promo codes and manager reports.

## Authentication

Everything except catalog reads and health checks requires a JWT bearer token:

```
Authorization: Bearer <your-jwt-token>
```

Promo administration, catalog writes and reports additionally require the
`manager` role.

## Money

Monetary amounts are decimal strings with two fractional digits, e.g. `"22.50"`.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "products", description = "Product catalog"),
        (name = "cart", description = "Shopping cart"),
        (name = "wishlist", description = "Saved products"),
        (name = "checkout", description = "Order placement"),
        (name = "orders", description = "Order history"),
        (name = "promotions", description = "Promo code administration"),
        (name = "reports", description = "Manager reports")
    ),
    paths(
        // Catalog
        crate::handlers::commerce::products::list_products,
        crate::handlers::commerce::products::get_product,
        crate::handlers::commerce::products::create_product,
        crate::handlers::commerce::products::update_product,
        crate::handlers::commerce::products::delete_product,

        // Cart
        crate::handlers::commerce::carts::get_cart,
        crate::handlers::commerce::carts::add_to_cart,
        crate::handlers::commerce::carts::update_cart_item,
        crate::handlers::commerce::carts::remove_cart_item,

        // Wishlist
        crate::handlers::commerce::wishlist::list_wishlist,
        crate::handlers::commerce::wishlist::add_to_wishlist,
        crate::handlers::commerce::wishlist::remove_from_wishlist,

        // Checkout and history
        crate::handlers::commerce::checkout::checkout,
        crate::handlers::orders::list_orders,

        // Promotions
        crate::handlers::promotions::create_promo,
        crate::handlers::promotions::list_promos,
        crate::handlers::promotions::update_promo,
        crate::handlers::promotions::delete_promo,

        // Reports
        crate::handlers::reports::sales_report,
        crate::handlers::reports::low_stock_report,
    ),
    components(
        schemas(
            crate::handlers::common::MessageResponse,

            // Catalog types
            crate::services::commerce::product_catalog_service::ProductResponse,
            crate::services::commerce::product_catalog_service::CreateProductInput,
            crate::services::commerce::product_catalog_service::UpdateProductInput,
            crate::services::commerce::product_catalog_service::ProductSort,

            // Cart and wishlist types
            crate::services::commerce::cart_service::AddToCartInput,
            crate::services::commerce::cart_service::UpdateCartItemInput,
            crate::services::commerce::cart_service::CartLineView,
            crate::services::commerce::cart_service::CartView,
            crate::services::commerce::wishlist_service::AddToWishlistInput,
            crate::services::commerce::wishlist_service::WishlistEntry,

            // Checkout and order types
            crate::handlers::commerce::checkout::CheckoutRequest,
            crate::handlers::commerce::checkout::CheckoutResponse,
            crate::services::orders::OrderReceipt,
            crate::services::orders::ReceiptLine,

            // Promotion types
            crate::entities::DiscountType,
            crate::services::promotion_admin::CreatePromoRequest,
            crate::services::promotion_admin::UpdatePromoRequest,
            crate::services::promotion_admin::PromoSummary,
            crate::handlers::promotions::PromoCreatedResponse,

            // Report types
            crate::services::reports::SalesSort,
            crate::services::reports::SalesReportRow,
            crate::services::reports::LowStockRow,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

/// Registers the `Bearer` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Pretty-printed OpenAPI document
pub fn openapi_json() -> Result<String, serde_json::Error> {
    ApiDocV1::openapi().to_pretty_json()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_storefront_paths_and_bearer_scheme() {
        let json = openapi_json().unwrap();
        assert!(json.contains("Grocery API"));
        assert!(json.contains("/api/v1/checkout"));
        assert!(json.contains("/api/v1/promo/{id}"));
        assert!(json.contains("/api/v1/reports/low-stock"));
        assert!(json.contains("\"Bearer\""));
    }
}
