use crate::{
    common::money,
    entities::{
        order::{self, Entity as Order, Model as OrderModel},
        order_item::{self, Entity as OrderItem, Model as OrderItemModel},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// A purchased line, priced as it was at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReceiptLine {
    /// Cleared if the product has since been removed from the catalog
    pub product_id: Option<Uuid>,
    pub product: String,
    #[schema(value_type = String, example = "10.00")]
    pub price: Decimal,
    pub quantity: i32,
    #[schema(value_type = String, example = "20.00")]
    pub total: Decimal,
}

impl From<&OrderItemModel> for ReceiptLine {
    fn from(item: &OrderItemModel) -> Self {
        Self {
            product_id: item.product_id,
            product: item.product_name.clone(),
            price: money(item.price),
            quantity: item.quantity,
            total: money(item.price * Decimal::from(item.quantity)),
        }
    }
}

/// Immutable view of a placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderReceipt {
    pub order_id: Uuid,
    #[schema(value_type = String, example = "25.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "2.50")]
    pub discount_applied: Decimal,
    #[schema(value_type = String, example = "22.50")]
    pub total_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ReceiptLine>,
}

impl OrderReceipt {
    pub fn from_parts(order: &OrderModel, items: &[OrderItemModel]) -> Self {
        Self {
            order_id: order.id,
            subtotal: money(order.subtotal),
            discount_applied: money(order.discount_applied),
            total_price: money(order.total_price),
            promo_code: order.promo_code.clone(),
            created_at: order.created_at,
            items: items.iter().map(ReceiptLine::from).collect(),
        }
    }
}

/// Read-only projection over committed orders
#[derive(Clone)]
pub struct OrderHistoryService {
    db: Arc<DatabaseConnection>,
}

impl OrderHistoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Every order placed by the user, newest first. Line prices come from the
    /// order snapshot, never from the current catalog.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderReceipt>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(&*self.db)
            .await?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut lines: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
        for item in OrderItem::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_item::Column::OrderId)
            .order_by_asc(order_item::Column::LineNo)
            .all(&*self.db)
            .await?
        {
            lines.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .iter()
            .map(|order| {
                let items = lines.get(&order.id).map(Vec::as_slice).unwrap_or(&[]);
                OrderReceipt::from_parts(order, items)
            })
            .collect())
    }
}
