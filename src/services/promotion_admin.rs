use crate::{
    auth::{authorize_manager, AuthUser},
    common::{deserialize_some, money},
    db::is_unique_violation,
    entities::{
        promo_code::{self, code_key, DiscountType, Entity as PromoCode, Model as PromoCodeModel},
        promo_usage::{self, Entity as PromoUsage},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Body for creating a promo code. Required fields are optional here so a
/// missing one is reported by name rather than as a JSON parse error.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreatePromoRequest {
    pub code: Option<String>,
    /// `percent` or `fixed`
    pub discount_type: Option<String>,
    #[schema(value_type = Option<String>, example = "10.00")]
    pub discount_value: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "0.00")]
    pub min_order_amount: Option<Decimal>,
    /// Must be present; `null` means the code never expires
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub expiry_date: Option<Option<DateTime<Utc>>>,
    pub active: Option<bool>,
    pub one_time_use: Option<bool>,
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePromoRequest {
    pub code: Option<String>,
    pub discount_type: Option<String>,
    #[schema(value_type = Option<String>)]
    pub discount_value: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub min_order_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub expiry_date: Option<Option<DateTime<Utc>>>,
    pub active: Option<bool>,
    pub one_time_use: Option<bool>,
}

/// Promo code as shown to managers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromoSummary {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    #[schema(value_type = String, example = "10.00")]
    pub discount_value: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub min_order_amount: Decimal,
    pub expiry_date: Option<DateTime<Utc>>,
    pub active: bool,
    pub one_time_use: bool,
}

impl From<PromoCodeModel> for PromoSummary {
    fn from(model: PromoCodeModel) -> Self {
        Self {
            id: model.id,
            code: model.code,
            discount_type: model.discount_type,
            discount_value: money(model.discount_value),
            min_order_amount: money(model.min_order_amount),
            expiry_date: model.expiry_date,
            active: model.active,
            one_time_use: model.one_time_use,
        }
    }
}

fn parse_discount_type(raw: &str) -> Result<DiscountType, ServiceError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "percent" => Ok(DiscountType::Percent),
        "fixed" => Ok(DiscountType::Fixed),
        _ => Err(ServiceError::ValidationError(
            "discount_type must be 'percent' or 'fixed'".to_string(),
        )),
    }
}

fn non_negative(field: &str, value: Decimal) -> Result<Decimal, ServiceError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(value)
}

fn normalized_code(raw: &str) -> Result<String, ServiceError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(ServiceError::MissingField("code".to_string()));
    }
    Ok(code.to_string())
}

fn duplicate_code() -> ServiceError {
    ServiceError::ValidationError("Promo code already exists".to_string())
}

/// Manager-only CRUD over promo codes
#[derive(Clone)]
pub struct PromotionAdminService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl PromotionAdminService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a promo code. `code`, `discount_type`, `discount_value` and
    /// `expiry_date` must all be present, checked in that order.
    #[instrument(skip(self, actor, input), fields(actor = %actor.user_id))]
    pub async fn create(
        &self,
        actor: &AuthUser,
        input: CreatePromoRequest,
    ) -> Result<PromoCodeModel, ServiceError> {
        authorize_manager(actor, "create promo codes")?;

        let code = normalized_code(
            input
                .code
                .as_deref()
                .ok_or_else(|| ServiceError::MissingField("code".to_string()))?,
        )?;
        let discount_type = parse_discount_type(
            input
                .discount_type
                .as_deref()
                .ok_or_else(|| ServiceError::MissingField("discount_type".to_string()))?,
        )?;
        let discount_value = non_negative(
            "discount_value",
            input
                .discount_value
                .ok_or_else(|| ServiceError::MissingField("discount_value".to_string()))?,
        )?;
        let expiry_date = input
            .expiry_date
            .ok_or_else(|| ServiceError::MissingField("expiry_date".to_string()))?;
        let min_order_amount = non_negative(
            "min_order_amount",
            input.min_order_amount.unwrap_or(Decimal::ZERO),
        )?;

        let key = code_key(&code);
        self.ensure_code_free(&*self.db, &key, None).await?;

        let now = Utc::now();
        let model = promo_code::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            code_key: Set(key),
            discount_type: Set(discount_type),
            discount_value: Set(discount_value),
            min_order_amount: Set(min_order_amount),
            expiry_date: Set(expiry_date),
            active: Set(input.active.unwrap_or(true)),
            one_time_use: Set(input.one_time_use.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let promo = model.insert(&*self.db).await.map_err(|err| {
            if is_unique_violation(&err) {
                duplicate_code()
            } else {
                err.into()
            }
        })?;

        self.event_sender
            .send_or_log(Event::PromoCreated {
                promo_id: promo.id,
                code: promo.code.clone(),
            })
            .await;

        info!(promo_id = %promo.id, code = %promo.code, "promo code created");
        Ok(promo)
    }

    /// All promo codes, newest first
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn list(&self, actor: &AuthUser) -> Result<Vec<PromoSummary>, ServiceError> {
        authorize_manager(actor, "view promo codes")?;

        let promos = PromoCode::find()
            .order_by_desc(promo_code::Column::CreatedAt)
            .order_by_asc(promo_code::Column::CodeKey)
            .all(&*self.db)
            .await?;

        Ok(promos.into_iter().map(PromoSummary::from).collect())
    }

    /// Replaces only the fields present in `input`.
    #[instrument(skip(self, actor, input), fields(actor = %actor.user_id))]
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        input: UpdatePromoRequest,
    ) -> Result<PromoCodeModel, ServiceError> {
        authorize_manager(actor, "update promo codes")?;

        let existing = PromoCode::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Promo code not found".to_string()))?;

        let mut model: promo_code::ActiveModel = existing.into();

        if let Some(raw) = input.code.as_deref() {
            let code = normalized_code(raw)?;
            let key = code_key(&code);
            self.ensure_code_free(&*self.db, &key, Some(id)).await?;
            model.code = Set(code);
            model.code_key = Set(key);
        }
        if let Some(raw) = input.discount_type.as_deref() {
            model.discount_type = Set(parse_discount_type(raw)?);
        }
        if let Some(value) = input.discount_value {
            model.discount_value = Set(non_negative("discount_value", value)?);
        }
        if let Some(value) = input.min_order_amount {
            model.min_order_amount = Set(non_negative("min_order_amount", value)?);
        }
        if let Some(expiry) = input.expiry_date {
            model.expiry_date = Set(expiry);
        }
        if let Some(active) = input.active {
            model.active = Set(active);
        }
        if let Some(one_time_use) = input.one_time_use {
            model.one_time_use = Set(one_time_use);
        }
        model.updated_at = Set(Utc::now());

        let promo = model.update(&*self.db).await.map_err(|err| {
            if is_unique_violation(&err) {
                duplicate_code()
            } else {
                err.into()
            }
        })?;

        self.event_sender
            .send_or_log(Event::PromoUpdated(promo.id))
            .await;

        Ok(promo)
    }

    /// Deletes a promo code together with its usage history.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        authorize_manager(actor, "delete promo codes")?;

        let txn = self.db.begin().await?;

        PromoUsage::delete_many()
            .filter(promo_usage::Column::PromoId.eq(id))
            .exec(&txn)
            .await?;

        let result = PromoCode::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::NotFound("Promo code not found".to_string()));
        }

        txn.commit().await?;

        self.event_sender.send_or_log(Event::PromoDeleted(id)).await;

        info!(promo_id = %id, "promo code deleted");
        Ok(())
    }

    async fn ensure_code_free<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = PromoCode::find().filter(promo_code::Column::CodeKey.eq(key));
        if let Some(id) = except {
            query = query.filter(promo_code::Column::Id.ne(id));
        }

        if query.one(conn).await?.is_some() {
            return Err(duplicate_code());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn discount_type_parsing_is_lenient_on_case() {
        assert_eq!(parse_discount_type(" Percent ").unwrap(), DiscountType::Percent);
        assert_eq!(parse_discount_type("FIXED").unwrap(), DiscountType::Fixed);
        assert!(parse_discount_type("bogo").is_err());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(non_negative("discount_value", dec!(-1)).is_err());
        assert_eq!(non_negative("discount_value", dec!(0)).unwrap(), dec!(0));
    }

    #[test]
    fn blank_code_is_missing() {
        let err = normalized_code("   ").unwrap_err();
        assert_eq!(err.to_string(), "code is required");
    }

    #[test]
    fn create_request_distinguishes_null_expiry() {
        let with_null: CreatePromoRequest =
            serde_json::from_str(r#"{"code":"X","expiry_date":null}"#).unwrap();
        assert_eq!(with_null.expiry_date, Some(None));

        let without: CreatePromoRequest = serde_json::from_str(r#"{"code":"X"}"#).unwrap();
        assert!(without.expiry_date.is_none());
    }
}
