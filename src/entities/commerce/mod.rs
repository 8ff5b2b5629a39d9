/// Commerce entities module
pub mod cart;
pub mod cart_item;
pub mod wishlist_item;

// Re-export entities
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use wishlist_item::{Entity as WishlistItem, Model as WishlistItemModel};
