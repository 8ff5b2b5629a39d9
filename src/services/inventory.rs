use crate::{
    entities::product::{self, Entity as Product},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Stock that has been taken off the shelf for an in-flight checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Owns product stock and popularity counters.
///
/// Both operations are single conditional UPDATE statements, so they take
/// effect atomically on whatever connection or transaction they run on.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    pub fn new() -> Self {
        Self
    }

    /// Takes `quantity` units off the shelf and bumps popularity by the same amount.
    ///
    /// Fails with `InsufficientStock(product name)` and leaves the row untouched
    /// when fewer than `quantity` units remain.
    #[instrument(skip(self, conn))]
    pub async fn reserve<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Reservation, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let result = Product::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(quantity),
            )
            .col_expr(
                product::Column::Popularity,
                Expr::col(product::Column::Popularity).add(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::Stock.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let name = product_name(conn, product_id).await?;
            debug!(%product_id, quantity, "reservation rejected");
            return Err(ServiceError::InsufficientStock(name));
        }

        Ok(Reservation {
            product_id,
            quantity,
        })
    }

    /// Puts a reservation back: restores stock and takes the popularity bump back off.
    #[instrument(skip(self, conn))]
    pub async fn release<C: ConnectionTrait>(
        &self,
        conn: &C,
        reservation: &Reservation,
    ) -> Result<(), ServiceError> {
        let result = Product::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).add(reservation.quantity),
            )
            .col_expr(
                product::Column::Popularity,
                Expr::col(product::Column::Popularity).sub(reservation.quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(reservation.product_id))
            .filter(product::Column::Popularity.gte(reservation.quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            warn!(
                product_id = %reservation.product_id,
                quantity = reservation.quantity,
                "release matched no product row"
            );
        }

        Ok(())
    }

    /// Releases every reservation, newest first. Failures are logged and skipped
    /// so one bad row does not strand the rest.
    pub async fn release_all<C: ConnectionTrait>(&self, conn: &C, reservations: &[Reservation]) {
        for reservation in reservations.iter().rev() {
            if let Err(e) = self.release(conn, reservation).await {
                warn!(
                    product_id = %reservation.product_id,
                    error = %e,
                    "failed to release reservation"
                );
            }
        }
    }
}

async fn product_name<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> Result<String, ServiceError> {
    let name: Option<String> = Product::find_by_id(product_id)
        .select_only()
        .column(product::Column::Name)
        .into_tuple()
        .one(conn)
        .await?;

    name.ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
}
