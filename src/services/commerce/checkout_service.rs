use crate::{
    common::money,
    db::{begin_serializable, is_serialization_failure},
    entities::{
        commerce::CartItemModel,
        order, order_item,
        product::{self, Entity as Product, Model as ProductModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        commerce::cart_service::CartService,
        inventory::{InventoryLedger, Reservation},
        orders::OrderReceipt,
        promotions::{DiscountResult, PromotionEvaluator},
    },
};
use chrono::Utc;
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Line captured at reservation time; becomes an order item.
#[derive(Debug, Clone)]
struct LineSnapshot {
    product_id: Uuid,
    name: String,
    price: Decimal,
    quantity: i32,
}

#[derive(Debug)]
struct PlacedOrder {
    receipt: OrderReceipt,
    redeemed_promo: Option<Uuid>,
}

fn is_retryable(err: &ServiceError) -> bool {
    matches!(err, ServiceError::DatabaseError(db_err) if is_serialization_failure(db_err))
}

/// Converts a user's cart into an order.
///
/// Stock reservations, the order rows, promo usage and the cart clear all
/// run in one serializable transaction. Either all of it commits or none of it does.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    ledger: InventoryLedger,
    promotions: PromotionEvaluator,
    max_attempts: u32,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        max_attempts: u32,
    ) -> Self {
        Self {
            db,
            event_sender,
            ledger: InventoryLedger::new(),
            promotions: PromotionEvaluator::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Checks out the user's cart, optionally applying a promo code.
    ///
    /// A blank code is treated as no code. Serialization conflicts reported by
    /// the database retry the whole checkout, up to the configured attempt limit.
    #[instrument(skip(self), fields(order_id))]
    pub async fn checkout(
        &self,
        user_id: Uuid,
        promo_code: Option<&str>,
    ) -> Result<OrderReceipt, ServiceError> {
        let started = Instant::now();
        let promo_code = promo_code.map(str::trim).filter(|code| !code.is_empty());

        let mut attempt = 1;
        let result = loop {
            match self.attempt(user_id, promo_code).await {
                Err(err) if attempt < self.max_attempts && is_retryable(&err) => {
                    counter!("grocery_checkout_retries_total", 1);
                    warn!(attempt, error = %err, "checkout conflicted with a concurrent transaction, retrying");
                    attempt += 1;
                }
                other => break other,
            }
        };

        histogram!(
            "grocery_checkout_duration_seconds",
            started.elapsed().as_secs_f64()
        );

        match result {
            Ok(placed) => {
                let receipt = placed.receipt;
                tracing::Span::current().record("order_id", tracing::field::display(receipt.order_id));
                counter!("grocery_checkout_completed_total", 1);
                info!(
                    order_id = %receipt.order_id,
                    total_price = %receipt.total_price,
                    discount_applied = %receipt.discount_applied,
                    lines = receipt.items.len(),
                    "checkout completed"
                );

                self.event_sender
                    .send_or_log(Event::OrderPlaced {
                        order_id: receipt.order_id,
                        user_id,
                        total_price: receipt.total_price,
                        discount_applied: receipt.discount_applied,
                        line_count: receipt.items.len(),
                        placed_at: receipt.created_at,
                    })
                    .await;
                if let Some(promo_id) = placed.redeemed_promo {
                    self.event_sender
                        .send_or_log(Event::PromoRedeemed {
                            promo_id,
                            user_id,
                            order_id: receipt.order_id,
                        })
                        .await;
                }

                Ok(receipt)
            }
            Err(err) => {
                if err.is_business_rule() {
                    counter!("grocery_checkout_rejected_total", 1, "reason" => err.code());
                    warn!(reason = err.code(), error = %err, "checkout rejected");
                } else if matches!(err, ServiceError::CommitFailed(_)) {
                    counter!("grocery_checkout_commit_failures_total", 1);
                }
                Err(err)
            }
        }
    }

    async fn attempt(
        &self,
        user_id: Uuid,
        promo_code: Option<&str>,
    ) -> Result<PlacedOrder, ServiceError> {
        let txn = begin_serializable(&self.db).await?;

        let placed = match self.place_order(&txn, user_id, promo_code).await {
            Ok(placed) => placed,
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "checkout rollback failed");
                }
                return Err(err);
            }
        };

        if let Err(err) = txn.commit().await {
            if is_serialization_failure(&err) {
                return Err(ServiceError::DatabaseError(err));
            }
            error!(
                %user_id,
                order_id = %placed.receipt.order_id,
                error = %err,
                "CHECKOUT COMMIT FAILURE: order transaction could not be made durable"
            );
            return Err(ServiceError::CommitFailed(err.to_string()));
        }

        Ok(placed)
    }

    /// Everything that happens inside the checkout transaction. Any failure
    /// after the first reservation releases the reservations made so far.
    async fn place_order(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
        promo_code: Option<&str>,
    ) -> Result<PlacedOrder, ServiceError> {
        let cart = CartService::find_cart(txn, user_id)
            .await?
            .ok_or(ServiceError::EmptyCart)?;
        let items = CartService::items(txn, cart.id).await?;
        if items.is_empty() {
            return Err(ServiceError::NoItems);
        }
        if items.iter().any(|item| item.quantity < 1) {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let mut reservations = Vec::with_capacity(items.len());
        match self
            .reserve_and_persist(txn, user_id, cart.id, &items, promo_code, &mut reservations)
            .await
        {
            Ok(placed) => Ok(placed),
            Err(err) => {
                self.ledger.release_all(txn, &reservations).await;
                Err(err)
            }
        }
    }

    async fn reserve_and_persist(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
        cart_id: Uuid,
        items: &[CartItemModel],
        promo_code: Option<&str>,
        reservations: &mut Vec<Reservation>,
    ) -> Result<PlacedOrder, ServiceError> {
        let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
        let products: HashMap<Uuid, ProductModel> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // Lines arrive in product-id order, so concurrent checkouts lock rows in the same order.
        let mut lines = Vec::with_capacity(items.len());
        let mut subtotal = Decimal::ZERO;
        for item in items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

            reservations.push(self.ledger.reserve(txn, product.id, item.quantity).await?);

            subtotal += product.price * Decimal::from(item.quantity);
            lines.push(LineSnapshot {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                quantity: item.quantity,
            });
        }

        let discount: Option<DiscountResult> = match promo_code {
            Some(code) => Some(
                self.promotions
                    .evaluate(txn, code, user_id, subtotal)
                    .await?,
            ),
            None => None,
        };
        let discount_applied = discount
            .as_ref()
            .map(|d| d.discount)
            .unwrap_or(Decimal::ZERO);
        let total_price = subtotal - discount_applied;

        let order_id = Uuid::new_v4();
        let order = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            subtotal: Set(money(subtotal)),
            discount_applied: Set(money(discount_applied)),
            total_price: Set(money(total_price)),
            promo_code: Set(discount.as_ref().map(|d| d.code.clone())),
            created_at: Set(Utc::now()),
        }
        .insert(txn)
        .await?;

        let mut order_items = Vec::with_capacity(lines.len());
        for (index, line) in lines.into_iter().enumerate() {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                line_no: Set(index as i32 + 1),
                product_id: Set(Some(line.product_id)),
                product_name: Set(line.name),
                price: Set(line.price),
                quantity: Set(line.quantity),
            }
            .insert(txn)
            .await?;
            order_items.push(item);
        }

        let mut redeemed_promo = None;
        if let Some(result) = discount.as_ref().filter(|d| d.one_time_use) {
            self.promotions
                .record_usage(txn, user_id, result.promo_id, order_id)
                .await?;
            redeemed_promo = Some(result.promo_id);
        }

        CartService::clear(txn, cart_id).await?;

        Ok(PlacedOrder {
            receipt: OrderReceipt::from_parts(&order, &order_items),
            redeemed_promo,
        })
    }
}
