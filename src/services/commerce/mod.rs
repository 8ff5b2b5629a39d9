/// Storefront services: catalog, carts, wishlists and checkout
pub mod cart_service;
pub mod checkout_service;
pub mod product_catalog_service;
pub mod wishlist_service;

// Re-export services for convenience
pub use cart_service::{AddToCartInput, CartService, CartView, UpdateCartItemInput};
pub use checkout_service::CheckoutService;
pub use product_catalog_service::ProductCatalogService;
pub use wishlist_service::WishlistService;
