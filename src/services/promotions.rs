use crate::{
    db::is_unique_violation,
    entities::{
        promo_code::{self, code_key, DiscountType, Entity as PromoCode, Model as PromoCodeModel},
        promo_usage::{self, Entity as PromoUsage},
    },
    errors::{PromoError, ServiceError},
};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Outcome of a successful promo evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountResult {
    pub promo_id: Uuid,
    pub code: String,
    pub discount: Decimal,
    pub one_time_use: bool,
}

/// Raw discount for a promo kind, clamped to `[0, subtotal]`.
///
/// Percent discounts are rounded to cents before clamping.
pub fn compute_discount(kind: DiscountType, value: Decimal, subtotal: Decimal) -> Decimal {
    let raw = match kind {
        DiscountType::Percent => (subtotal * value / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        DiscountType::Fixed => value,
    };

    raw.min(subtotal).max(Decimal::ZERO)
}

/// Eligibility checks after lookup, in order: expiry, minimum order, prior use.
pub fn assess(
    promo: &PromoCodeModel,
    subtotal: Decimal,
    now: DateTime<Utc>,
    already_used: bool,
) -> Result<Decimal, PromoError> {
    if let Some(expiry) = promo.expiry_date {
        if expiry < now {
            return Err(PromoError::Expired);
        }
    }

    if subtotal < promo.min_order_amount {
        return Err(PromoError::BelowMinimum {
            minimum: crate::common::money(promo.min_order_amount),
        });
    }

    if promo.one_time_use && already_used {
        return Err(PromoError::AlreadyUsed);
    }

    Ok(compute_discount(
        promo.discount_type,
        promo.discount_value,
        subtotal,
    ))
}

/// Validates promo codes against a subtotal and records one-time redemptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionEvaluator;

impl PromotionEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Looks up an active promo by code (case-insensitive) and computes its discount.
    #[instrument(skip(self, conn))]
    pub async fn evaluate<C: ConnectionTrait>(
        &self,
        conn: &C,
        code: &str,
        user_id: Uuid,
        subtotal: Decimal,
    ) -> Result<DiscountResult, ServiceError> {
        let promo = PromoCode::find()
            .filter(promo_code::Column::CodeKey.eq(code_key(code)))
            .filter(promo_code::Column::Active.eq(true))
            .one(conn)
            .await?
            .ok_or(PromoError::InvalidCode)?;

        let already_used = if promo.one_time_use {
            self.has_used(conn, user_id, promo.id).await?
        } else {
            false
        };

        let discount = assess(&promo, subtotal, Utc::now(), already_used)?;
        debug!(promo_id = %promo.id, %discount, "promo accepted");

        Ok(DiscountResult {
            promo_id: promo.id,
            code: promo.code,
            discount,
            one_time_use: promo.one_time_use,
        })
    }

    pub async fn has_used<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        promo_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let count = PromoUsage::find()
            .filter(promo_usage::Column::UserId.eq(user_id))
            .filter(promo_usage::Column::PromoId.eq(promo_id))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    /// Inserts the (user, promo) usage row under a savepoint. A concurrent
    /// redemption that got there first surfaces as `AlreadyUsed`, and the
    /// enclosing transaction stays usable for compensation.
    #[instrument(skip(self, conn))]
    pub async fn record_usage<C>(
        &self,
        conn: &C,
        user_id: Uuid,
        promo_id: Uuid,
        order_id: Uuid,
    ) -> Result<(), ServiceError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let savepoint = conn.begin().await?;

        let usage = promo_usage::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            promo_id: Set(promo_id),
            order_id: Set(order_id),
            used_at: Set(Utc::now()),
        };

        match usage.insert(&savepoint).await {
            Ok(_) => {
                savepoint.commit().await?;
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => {
                savepoint.rollback().await?;
                Err(PromoError::AlreadyUsed.into())
            }
            Err(err) => {
                savepoint.rollback().await?;
                Err(err.into())
            }
        }
    }
}
