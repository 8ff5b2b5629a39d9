/// Common types and utilities shared across handlers and services
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::sea_query::LikeExpr;
use serde::{Deserialize, Deserializer};

/// Rounds to cents and pins the scale at two fractional digits, so amounts
/// serialize as `"22.50"` regardless of how the backend stored them.
pub fn money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Distinguishes an absent field from an explicit `null` in partial updates.
///
/// Use with `#[serde(default, deserialize_with = "deserialize_some")]` on an
/// `Option<Option<T>>` field: absent gives `None`, `null` gives `Some(None)`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Lower-cased `%needle%` pattern for case-insensitive substring filters.
/// LIKE wildcards in the needle match literally.
pub fn contains_pattern(needle: &str) -> LikeExpr {
    LikeExpr::new(substring_pattern(needle)).escape('\\')
}

fn substring_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.trim().to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
