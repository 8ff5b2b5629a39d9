//! Seed data script - populates the database with a demo grocery catalog
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - a dozen products across fruit, dairy, bakery, vegetables and pantry
//! - promo codes SAVE10 (10% over 20.00), EXPIRED2023 and WELCOME5 (one-time 5.00 off)
//!
//! Running it twice is safe: existing products and codes are left alone.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use std::time::Duration as StdDuration;
use tracing::info;
use uuid::Uuid;

use grocery_api::entities::{
    product::{self, Entity as Product},
    promo_code::{self, code_key, DiscountType, Entity as PromoCode},
};
use grocery_api::migrator::Migrator;

struct SeedProduct {
    name: &'static str,
    category: &'static str,
    price: Decimal,
    stock: i32,
}

struct SeedPromo {
    code: &'static str,
    discount_type: DiscountType,
    discount_value: Decimal,
    min_order_amount: Decimal,
    expired: bool,
    one_time_use: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Grocery API Seed Data ===");

    let database_url = std::env::var("APP__DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| "sqlite://grocery.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(StdDuration::from_secs(10))
        .acquire_timeout(StdDuration::from_secs(10));

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    info!("Creating products...");
    let created = create_products(&db).await?;
    info!("  Created {} products", created);

    info!("Creating promo codes...");
    let created = create_promos(&db).await?;
    info!("  Created {} promo codes", created);

    info!("=== Seed Data Complete ===");
    info!("Try: curl http://localhost:8080/api/v1/products?sort=popular");

    Ok(())
}

async fn create_products(db: &DatabaseConnection) -> anyhow::Result<usize> {
    if Product::find().count(db).await? > 0 {
        info!("  Catalog already populated, skipping");
        return Ok(0);
    }

    let catalog = [
        SeedProduct { name: "Apples", category: "Fruit", price: dec!(2.50), stock: 120 },
        SeedProduct { name: "Bananas", category: "Fruit", price: dec!(1.20), stock: 200 },
        SeedProduct { name: "Strawberries", category: "Fruit", price: dec!(4.99), stock: 35 },
        SeedProduct { name: "Whole Milk", category: "Dairy", price: dec!(3.49), stock: 80 },
        SeedProduct { name: "Oat Milk", category: "Dairy Alternatives", price: dec!(4.25), stock: 40 },
        SeedProduct { name: "Cheddar Cheese", category: "Dairy", price: dec!(6.75), stock: 25 },
        SeedProduct { name: "Free Range Eggs", category: "Dairy", price: dec!(5.10), stock: 60 },
        SeedProduct { name: "Sourdough Loaf", category: "Bakery", price: dec!(5.50), stock: 18 },
        SeedProduct { name: "Baby Spinach", category: "Vegetables", price: dec!(2.99), stock: 45 },
        SeedProduct { name: "Vine Tomatoes", category: "Vegetables", price: dec!(3.20), stock: 70 },
        SeedProduct { name: "Basmati Rice", category: "Pantry", price: dec!(8.00), stock: 55 },
        SeedProduct { name: "Coffee Beans", category: "Pantry", price: dec!(12.00), stock: 10 },
    ];

    let now = Utc::now();
    for item in &catalog {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(item.name.to_string()),
            category: Set(item.category.to_string()),
            price: Set(item.price),
            stock: Set(item.stock),
            popularity: Set(0),
            image_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }

    Ok(catalog.len())
}

async fn create_promos(db: &DatabaseConnection) -> anyhow::Result<usize> {
    let promos = [
        SeedPromo {
            code: "SAVE10",
            discount_type: DiscountType::Percent,
            discount_value: dec!(10),
            min_order_amount: dec!(20),
            expired: false,
            one_time_use: false,
        },
        SeedPromo {
            code: "EXPIRED2023",
            discount_type: DiscountType::Fixed,
            discount_value: dec!(5),
            min_order_amount: Decimal::ZERO,
            expired: true,
            one_time_use: false,
        },
        SeedPromo {
            code: "WELCOME5",
            discount_type: DiscountType::Fixed,
            discount_value: dec!(5),
            min_order_amount: Decimal::ZERO,
            expired: false,
            one_time_use: true,
        },
    ];

    let expired_at = Utc
        .with_ymd_and_hms(2023, 12, 31, 23, 59, 59)
        .single()
        .ok_or_else(|| anyhow::anyhow!("invalid seed expiry date"))?;

    let mut created = 0;
    for promo in &promos {
        let key = code_key(promo.code);
        let exists = PromoCode::find()
            .filter(promo_code::Column::CodeKey.eq(key.clone()))
            .count(db)
            .await?
            > 0;
        if exists {
            info!("  {} already exists, skipping", promo.code);
            continue;
        }

        let now = Utc::now();
        promo_code::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(promo.code.to_string()),
            code_key: Set(key),
            discount_type: Set(promo.discount_type),
            discount_value: Set(promo.discount_value),
            min_order_amount: Set(promo.min_order_amount),
            expiry_date: Set(promo.expired.then_some(expired_at)),
            active: Set(true),
            one_time_use: Set(promo.one_time_use),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
        created += 1;
    }

    Ok(created)
}
