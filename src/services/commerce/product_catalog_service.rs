use crate::{
    auth::{authorize_manager, AuthUser},
    common::{contains_pattern, money},
    entities::{
        commerce::{cart_item, wishlist_item, CartItem, WishlistItem},
        order_item::{self, Entity as OrderItem},
        product::{self, Entity as Product, Model as ProductModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductSort {
    /// Name ascending
    #[default]
    Name,
    /// Popularity descending
    Popular,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-insensitive substring match on category
    pub category: Option<String>,
    pub sort: Option<ProductSort>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(value_type = String, example = "4.99")]
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[schema(value_type = String, example = "4.99")]
    pub price: Decimal,
    pub stock: i32,
    pub popularity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductModel> for ProductResponse {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
            price: money(model.price),
            stock: model.stock,
            popularity: model.popularity,
            image_url: model.image_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Custom validator for Decimal minimum value
fn validate_decimal_min_zero(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("decimal_min_zero"));
    }
    Ok(())
}

/// Catalog reads are public; writes are manager-only.
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: ProductQuery) -> Result<Vec<ProductResponse>, ServiceError> {
        let mut select = Product::find();

        if let Some(category) = query.category.as_deref().filter(|c| !c.trim().is_empty()) {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(product::Column::Category)))
                    .like(contains_pattern(category)),
            );
        }

        select = match query.sort.unwrap_or_default() {
            ProductSort::Popular => select
                .order_by_desc(product::Column::Popularity)
                .order_by_asc(product::Column::Name),
            ProductSort::Name => select.order_by_asc(product::Column::Name),
        };

        let products = select.all(&*self.db).await?;
        Ok(products.into_iter().map(ProductResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.user_id))]
    pub async fn create(
        &self,
        actor: &AuthUser,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        authorize_manager(actor, "add products")?;
        input.validate()?;

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            category: Set(input.category.trim().to_string()),
            price: Set(input.price),
            stock: Set(input.stock),
            popularity: Set(0),
            image_url: Set(input.image_url),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let product = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;

        info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.user_id))]
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        authorize_manager(actor, "update products")?;
        input.validate()?;

        let existing = self.get(id).await?;
        let mut model: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(category) = input.category {
            model.category = Set(category.trim().to_string());
        }
        if let Some(price) = input.price {
            model.price = Set(price);
        }
        if let Some(stock) = input.stock {
            model.stock = Set(stock);
        }
        if let Some(image_url) = input.image_url {
            model.image_url = Set(Some(image_url));
        }
        model.updated_at = Set(Utc::now());

        let product = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product.id))
            .await;

        Ok(product)
    }

    /// Removes a product along with any cart and wishlist lines for it.
    /// Past order lines keep their name and price snapshot.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        authorize_manager(actor, "delete products")?;

        let txn = self.db.begin().await?;

        CartItem::delete_many()
            .filter(cart_item::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        WishlistItem::delete_many()
            .filter(wishlist_item::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        OrderItem::update_many()
            .col_expr(order_item::Column::ProductId, Expr::value(Option::<Uuid>::None))
            .filter(order_item::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;

        let result = Product::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::NotFound("Product not found".to_string()));
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;

        info!(product_id = %id, "product deleted");
        Ok(())
    }
}
