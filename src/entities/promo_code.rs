use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// How a promo's `discount_value` is applied to the subtotal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the subtotal
    #[sea_orm(string_value = "percent")]
    Percent,
    /// `discount_value` is a fixed currency amount
    #[sea_orm(string_value = "fixed")]
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percent => "percent",
            DiscountType::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Promotion code. `code` keeps the manager's spelling, `code_key` is the
/// trimmed lower-case form used for lookups and uniqueness.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promo_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    #[sea_orm(unique)]
    pub code_key: String,
    pub discount_type: DiscountType,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount_value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub min_order_amount: Decimal,
    #[sea_orm(nullable)]
    pub expiry_date: Option<DateTime<Utc>>,
    pub active: bool,
    pub one_time_use: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::promo_usage::Entity")]
    PromoUsages,
}

impl Related<super::promo_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromoUsages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Normalizes a user-entered code into its lookup key.
pub fn code_key(code: &str) -> String {
    code.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_key_is_case_and_whitespace_insensitive() {
        assert_eq!(code_key("  Save10 "), "save10");
        assert_eq!(code_key("SAVE10"), code_key("save10"));
    }

    #[test]
    fn discount_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DiscountType::Percent).unwrap(),
            "\"percent\""
        );
        let parsed: DiscountType = serde_json::from_str("\"fixed\"").unwrap();
        assert_eq!(parsed, DiscountType::Fixed);
    }
}
