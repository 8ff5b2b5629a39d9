// Checkout engine
pub mod inventory;
pub mod promotions;

// Order history
pub mod orders;

// Manager-facing services
pub mod promotion_admin;
pub mod reports;

// Storefront
pub mod commerce;
