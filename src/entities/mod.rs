pub mod commerce;
pub mod order;
pub mod order_item;
pub mod product;
pub mod promo_code;
pub mod promo_usage;

pub use order::{Entity as Order, Model as OrderModel};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use promo_code::{DiscountType, Entity as PromoCode, Model as PromoCodeModel};
pub use promo_usage::{Entity as PromoUsage, Model as PromoUsageModel};
