use crate::database::entities::{
    SearchBudget, SpendRecord, search_budgets, spend_records,
};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Budgets DAO for database operations
#[derive(Clone)]
pub struct BudgetsDao {
    db: DatabaseConnection,
}

impl BudgetsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: i32,
        monthly_limit: Decimal,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> DatabaseResult<SearchBudget> {
        let now = Utc::now();
        let active_model = search_budgets::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: Set(user_id),
            monthly_limit: Set(monthly_limit),
            current_spent: Set(Decimal::ZERO),
            period_start: Set(period_start),
            period_end: Set(period_end),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let budget = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(budget)
    }

    pub async fn find_by_id(&self, budget_id: i32) -> DatabaseResult<Option<SearchBudget>> {
        let budget = search_budgets::Entity::find_by_id(budget_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(budget)
    }

    /// The single active budget for a user, if one exists
    pub async fn find_active_for_user(&self, user_id: i32) -> DatabaseResult<Option<SearchBudget>> {
        let budget = search_budgets::Entity::find()
            .filter(search_budgets::Column::UserId.eq(user_id))
            .filter(search_budgets::Column::IsActive.eq(true))
            .order_by_desc(search_budgets::Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(budget)
    }

    /// All budgets a user has, newest first (active and historical)
    pub async fn find_by_user(&self, user_id: i32) -> DatabaseResult<Vec<SearchBudget>> {
        let budgets = search_budgets::Entity::find()
            .filter(search_budgets::Column::UserId.eq(user_id))
            .order_by_desc(search_budgets::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(budgets)
    }

    /// Deactivate every active budget a user has. Called before creating a
    /// replacement so the one-active-budget-per-user invariant holds.
    pub async fn deactivate_for_user(&self, user_id: i32) -> DatabaseResult<u64> {
        let result = search_budgets::Entity::update_many()
            .col_expr(search_budgets::Column::IsActive, Expr::value(false))
            .col_expr(search_budgets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(search_budgets::Column::UserId.eq(user_id))
            .filter(search_budgets::Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Partial update of limit, period, or active flag. `current_spent` is
    /// deliberately not reachable from here.
    pub async fn update(
        &self,
        budget_id: i32,
        monthly_limit: Option<Decimal>,
        period_start: Option<DateTime<Utc>>,
        period_end: Option<DateTime<Utc>>,
        is_active: Option<bool>,
    ) -> DatabaseResult<SearchBudget> {
        let mut active_model = search_budgets::ActiveModel {
            id: Set(budget_id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(monthly_limit) = monthly_limit {
            active_model.monthly_limit = Set(monthly_limit);
        }
        if let Some(period_start) = period_start {
            active_model.period_start = Set(period_start);
        }
        if let Some(period_end) = period_end {
            active_model.period_end = Set(period_end);
        }
        if let Some(is_active) = is_active {
            active_model.is_active = Set(is_active);
        }

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Atomically add `amount` to `current_spent` as a single UPDATE, so
    /// concurrent spend recordings never lose increments. Returns the number
    /// of rows touched (0 when the budget row is gone).
    pub async fn add_spent(&self, budget_id: i32, amount: Decimal) -> DatabaseResult<u64> {
        let result = search_budgets::Entity::update_many()
            .col_expr(
                search_budgets::Column::CurrentSpent,
                Expr::col(search_budgets::Column::CurrentSpent).add(amount),
            )
            .col_expr(search_budgets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(search_budgets::Column::Id.eq(budget_id))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Zero the counter and move the budget onto a new period
    pub async fn reset_period(
        &self,
        budget_id: i32,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> DatabaseResult<SearchBudget> {
        let active_model = search_budgets::ActiveModel {
            id: Set(budget_id),
            current_spent: Set(Decimal::ZERO),
            period_start: Set(period_start),
            period_end: Set(period_end),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Append a spend event (the analytics source of truth)
    pub async fn insert_spend_record(
        &self,
        budget_id: i32,
        user_id: i32,
        search_id: Option<i32>,
        amount: Decimal,
        recorded_at: DateTime<Utc>,
    ) -> DatabaseResult<SpendRecord> {
        let active_model = spend_records::ActiveModel {
            id: ActiveValue::NotSet,
            budget_id: Set(budget_id),
            user_id: Set(user_id),
            search_id: Set(search_id),
            amount: Set(amount),
            recorded_at: Set(recorded_at),
        };

        let record = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(record)
    }

    /// All spend events for a user since `since`, newest first
    pub async fn spend_records_since(
        &self,
        user_id: i32,
        since: DateTime<Utc>,
    ) -> DatabaseResult<Vec<SpendRecord>> {
        let records = spend_records::Entity::find()
            .filter(spend_records::Column::UserId.eq(user_id))
            .filter(spend_records::Column::RecordedAt.gte(since))
            .order_by_desc(spend_records::Column::RecordedAt)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(records)
    }
}
