use crate::{
    common::money,
    entities::{
        commerce::{cart, cart_item, Cart, CartItem, CartItemModel, CartModel},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Input for adding a product to the caller's cart
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    /// Defaults to 1
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItemInput {
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// One cart line priced at the live catalog price
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLineView {
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub product: String,
    #[schema(value_type = String, example = "4.99")]
    pub price: Decimal,
    pub quantity: i32,
    #[schema(value_type = String, example = "9.98")]
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    #[schema(value_type = String, example = "9.98")]
    pub subtotal: Decimal,
}

/// Per-user shopping cart. Every user has at most one cart, and a product
/// appears at most once in it.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Returns the user's cart, creating it on first access.
    pub async fn get_or_create<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<CartModel, ServiceError> {
        let new_cart = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        };

        Cart::insert(new_cart)
            .on_conflict(OnConflict::column(cart::Column::UserId).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await?;

        Self::find_cart(conn, user_id)
            .await?
            .ok_or_else(|| ServiceError::InternalError("Cart upsert returned no row".to_string()))
    }

    pub async fn find_cart<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Option<CartModel>, ServiceError> {
        Ok(Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(conn)
            .await?)
    }

    /// Cart lines in ascending product order.
    pub async fn items<C: ConnectionTrait>(
        conn: &C,
        cart_id: Uuid,
    ) -> Result<Vec<CartItemModel>, ServiceError> {
        Ok(CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::ProductId)
            .all(conn)
            .await?)
    }

    /// Removes every line from the cart, returning how many were deleted.
    pub async fn clear<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> Result<u64, ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Adds a product to the cart, or increments the quantity of its existing line.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        input: AddToCartInput,
    ) -> Result<(), ServiceError> {
        input.validate()?;
        let quantity = input.quantity.unwrap_or(1);

        Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let cart = Self::get_or_create(&*self.db, user_id).await?;
        let now = Utc::now();

        let line = cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart.id),
            product_id: Set(input.product_id),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(now),
        };

        CartItem::insert(line)
            .on_conflict(
                OnConflict::columns([cart_item::Column::CartId, cart_item::Column::ProductId])
                    .value(
                        cart_item::Column::Quantity,
                        Expr::cust("cart_items.quantity + excluded.quantity"),
                    )
                    .update_column(cart_item::Column::UpdatedAt)
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        info!(cart_id = %cart.id, product_id = %input.product_id, quantity, "added to cart");
        Ok(())
    }

    /// Sets the quantity of one of the caller's cart lines.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        input: UpdateCartItemInput,
    ) -> Result<CartItemModel, ServiceError> {
        input.validate()?;

        let item = self.owned_item(user_id, item_id).await?;
        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(input.quantity);
        item.updated_at = Set(Utc::now());

        Ok(item.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let item = self.owned_item(user_id, item_id).await?;
        CartItem::delete_by_id(item.id).exec(&*self.db).await?;
        Ok(())
    }

    /// The caller's cart priced at current catalog prices.
    #[instrument(skip(self))]
    pub async fn view(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let cart = Self::get_or_create(&*self.db, user_id).await?;
        let items = Self::items(&*self.db, cart.id).await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, product::Model> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut subtotal = Decimal::ZERO;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let Some(product) = products.get(&item.product_id) else {
                continue;
            };
            let total = product.price * Decimal::from(item.quantity);
            subtotal += total;
            lines.push(CartLineView {
                item_id: item.id,
                product_id: product.id,
                product: product.name.clone(),
                price: money(product.price),
                quantity: item.quantity,
                total: money(total),
            });
        }

        Ok(CartView {
            items: lines,
            subtotal: money(subtotal),
        })
    }

    async fn owned_item(&self, user_id: Uuid, item_id: Uuid) -> Result<CartItemModel, ServiceError> {
        let not_found = || ServiceError::NotFound("Cart item not found".to_string());

        let cart = Self::find_cart(&*self.db, user_id)
            .await?
            .ok_or_else(not_found)?;

        CartItem::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart.id))
            .one(&*self.db)
            .await?
            .ok_or_else(not_found)
    }
}
