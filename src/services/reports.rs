use crate::{
    auth::{authorize_manager, AuthUser},
    common::contains_pattern,
    entities::product::{self, Entity as Product},
    errors::ServiceError,
};
use sea_orm::{
    sea_query::{Expr, Func},
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SalesSort {
    #[default]
    MostSold,
    LeastSold,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesReportQuery {
    pub sort: Option<SalesSort>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    /// Products with stock strictly below this value are reported
    pub threshold: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesReportRow {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub total_sold: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LowStockRow {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub stock: i32,
}

/// Manager reporting over the catalog counters the inventory ledger maintains
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
    default_low_stock_threshold: i32,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>, default_low_stock_threshold: i32) -> Self {
        Self {
            db,
            default_low_stock_threshold,
        }
    }

    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn sales_report(
        &self,
        actor: &AuthUser,
        query: SalesReportQuery,
    ) -> Result<Vec<SalesReportRow>, ServiceError> {
        authorize_manager(actor, "view reports")?;

        let mut select = Product::find();
        if let Some(category) = query.category.as_deref().filter(|c| !c.trim().is_empty()) {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(product::Column::Category)))
                    .like(contains_pattern(category)),
            );
        }

        select = match query.sort.unwrap_or_default() {
            SalesSort::MostSold => select.order_by_desc(product::Column::Popularity),
            SalesSort::LeastSold => select.order_by_asc(product::Column::Popularity),
        };

        let rows = select
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|p| SalesReportRow {
                product_id: p.id,
                name: p.name,
                category: p.category,
                total_sold: p.popularity,
            })
            .collect())
    }

    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn low_stock(
        &self,
        actor: &AuthUser,
        query: LowStockQuery,
    ) -> Result<Vec<LowStockRow>, ServiceError> {
        authorize_manager(actor, "view reports")?;

        let threshold = query
            .threshold
            .unwrap_or(self.default_low_stock_threshold);
        if threshold < 0 {
            return Err(ServiceError::ValidationError(
                "threshold must not be negative".to_string(),
            ));
        }

        let rows = Product::find()
            .filter(product::Column::Stock.lt(threshold))
            .order_by_asc(product::Column::Stock)
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|p| LowStockRow {
                product_id: p.id,
                name: p.name,
                category: p.category,
                stock: p.stock,
            })
            .collect())
    }
}
