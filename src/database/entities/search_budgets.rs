use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Monthly spending cap for a user. At most one budget per user is active at
/// a time; historical budgets are kept with `is_active = false`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "search_budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub monthly_limit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub current_spent: Decimal,
    /// Half-open period: `period_end` is exclusive.
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether spend may still be recorded against this budget at `now`.
    pub fn accepts_spend(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.period_end
    }

    pub fn percentage_used(&self) -> f64 {
        if self.monthly_limit.is_zero() {
            return 0.0;
        }
        let ratio = self.current_spent / self.monthly_limit;
        ratio.to_f64().unwrap_or(0.0) * 100.0
    }

    pub fn remaining(&self) -> Decimal {
        self.monthly_limit - self.current_spent
    }
}
