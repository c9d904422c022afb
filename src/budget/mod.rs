//! Budget ledger: monthly spending caps, spend accounting, analytics, alerts.

use crate::database::DatabaseManager;
use crate::database::entities::SearchBudget;
use crate::error::AppError;
use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Budget-or-null snapshot for the dashboard widget
#[derive(Debug, Serialize, ToSchema)]
pub struct BudgetSummary {
    pub budget: Option<SearchBudget>,
    pub remaining_budget: Option<Decimal>,
    pub percentage_used: f64,
    pub spending_this_month: Decimal,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpendTrend {
    OverBudget,
    OnTrack,
    UnderBudget,
}

/// Trailing-window spending analytics, derived from spend records
#[derive(Debug, Serialize, ToSchema)]
pub struct SpendingAnalytics {
    pub total_spent: Decimal,
    pub average_daily: Decimal,
    pub trend: SpendTrend,
    pub projection: Decimal,
    pub days_elapsed: i64,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BudgetAlert {
    pub alert_type: String,
    pub severity: String,
    pub message: String,
    pub percentage_used: f64,
}

/// Budget ledger service
#[derive(Clone)]
pub struct BudgetService {
    database: Arc<dyn DatabaseManager>,
}

impl BudgetService {
    pub fn new(database: Arc<dyn DatabaseManager>) -> Self {
        Self { database }
    }

    /// Create a budget. When created active, any previously active budget for
    /// the user is deactivated first so at most one stays active.
    pub async fn create(
        &self,
        user_id: i32,
        monthly_limit: Decimal,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        is_active: bool,
    ) -> Result<SearchBudget, AppError> {
        validate_budget_fields(monthly_limit, period_start, period_end)?;

        if is_active {
            self.database.budgets().deactivate_for_user(user_id).await?;
        }

        let budget = self
            .database
            .budgets()
            .create(user_id, monthly_limit, period_start, period_end)
            .await?;

        let budget = if is_active {
            budget
        } else {
            self.database
                .budgets()
                .update(budget.id, None, None, None, Some(false))
                .await?
        };

        tracing::info!(user_id, budget_id = budget.id, %monthly_limit, "budget created");
        Ok(budget)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<SearchBudget>, AppError> {
        Ok(self.database.budgets().find_by_user(user_id).await?)
    }

    /// Partial update. Never touches `current_spent`.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        user_id: i32,
        budget_id: i32,
        monthly_limit: Option<Decimal>,
        period_start: Option<DateTime<Utc>>,
        period_end: Option<DateTime<Utc>>,
        is_active: Option<bool>,
    ) -> Result<SearchBudget, AppError> {
        let existing = self.owned_budget(user_id, budget_id).await?;

        let new_limit = monthly_limit.unwrap_or(existing.monthly_limit);
        let new_start = period_start.unwrap_or(existing.period_start);
        let new_end = period_end.unwrap_or(existing.period_end);
        validate_budget_fields(new_limit, new_start, new_end)?;

        if is_active == Some(true) {
            self.database.budgets().deactivate_for_user(user_id).await?;
        }

        let updated = self
            .database
            .budgets()
            .update(budget_id, monthly_limit, period_start, period_end, is_active)
            .await?;

        Ok(updated)
    }

    /// Cost-metering hook: the search-execution engine reports actual spend
    /// per billed run. The increment is a single storage-level UPDATE and an
    /// append-only spend record is written next to it.
    pub async fn record_spend(
        &self,
        user_id: i32,
        budget_id: i32,
        search_id: Option<i32>,
        amount: Decimal,
    ) -> Result<SearchBudget, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "amount must be positive, got {}",
                amount
            )));
        }

        let budget = self.owned_budget(user_id, budget_id).await?;
        let now = Utc::now();
        // A lapsed budget must not silently keep accruing
        if !budget.accepts_spend(now) {
            return Err(AppError::NotFound(format!(
                "budget {} is inactive or its period has elapsed",
                budget_id
            )));
        }

        self.database.budgets().add_spent(budget_id, amount).await?;
        self.database
            .budgets()
            .insert_spend_record(budget_id, budget.user_id, search_id, amount, now)
            .await?;

        metrics::counter!("vinyldigger_spend_recorded_total").increment(1);
        tracing::info!(user_id, budget_id, %amount, "spend recorded");

        self.database
            .budgets()
            .find_by_id(budget_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("budget {} not found", budget_id)))
    }

    /// Explicit monthly reset: zero the counter and advance both period
    /// bounds by one calendar month. Each call advances again.
    pub async fn reset_monthly(&self, user_id: i32) -> Result<SearchBudget, AppError> {
        let budget = self
            .database
            .budgets()
            .find_active_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no active budget".to_string()))?;

        let (new_start, new_end) = advance_period(budget.period_start, budget.period_end)?;
        let updated = self
            .database
            .budgets()
            .reset_period(budget.id, new_start, new_end)
            .await?;

        tracing::info!(user_id, budget_id = budget.id, "budget reset to new period");
        Ok(updated)
    }

    pub async fn summary(&self, user_id: i32) -> Result<BudgetSummary, AppError> {
        let budget = self.database.budgets().find_active_for_user(user_id).await?;
        let now = Utc::now();

        let summary = match budget {
            Some(budget) => BudgetSummary {
                remaining_budget: Some(budget.remaining()),
                percentage_used: budget.percentage_used(),
                spending_this_month: budget.current_spent,
                days_remaining: days_remaining(&budget, now),
                budget: Some(budget),
            },
            None => BudgetSummary {
                budget: None,
                remaining_budget: None,
                percentage_used: 0.0,
                spending_this_month: Decimal::ZERO,
                days_remaining: 0,
            },
        };

        Ok(summary)
    }

    /// Analytics over a trailing window of `days`, computed from spend
    /// records. Requires an active budget (trend and projection are
    /// budget-relative).
    pub async fn analytics(&self, user_id: i32, days: i64) -> Result<SpendingAnalytics, AppError> {
        if days < 1 {
            return Err(AppError::Validation(format!(
                "days must be at least 1, got {}",
                days
            )));
        }

        let budget = self
            .database
            .budgets()
            .find_active_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no active budget".to_string()))?;

        let now = Utc::now();
        let window_start = now - chrono::Duration::days(days);
        let records = self
            .database
            .budgets()
            .spend_records_since(user_id, window_start)
            .await?;

        let total_spent: Decimal = records.iter().map(|r| r.amount).sum();
        let days_elapsed = days.min(((now - budget.period_start).num_days()).max(1));
        let average_daily = total_spent / Decimal::from(days_elapsed);

        let period_length_days = (budget.period_end - budget.period_start).num_days().max(1);
        let projection = average_daily * Decimal::from(period_length_days);

        let expected = prorated_expectation(&budget, now);
        let trend = classify_trend(budget.current_spent, expected);

        Ok(SpendingAnalytics {
            total_spent,
            average_daily,
            trend,
            projection,
            days_elapsed,
            days_remaining: days_remaining(&budget, now),
        })
    }

    pub async fn alerts(&self, user_id: i32) -> Result<Vec<BudgetAlert>, AppError> {
        let budget = self.database.budgets().find_active_for_user(user_id).await?;
        Ok(budget
            .map(|b| classify_alerts(&b, Utc::now()))
            .unwrap_or_default())
    }

    async fn owned_budget(&self, user_id: i32, budget_id: i32) -> Result<SearchBudget, AppError> {
        let budget = self
            .database
            .budgets()
            .find_by_id(budget_id)
            .await?
            .filter(|b| b.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("budget {} not found", budget_id)))?;

        Ok(budget)
    }
}

fn validate_budget_fields(
    monthly_limit: Decimal,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> Result<(), AppError> {
    if monthly_limit <= Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "monthly_limit must be positive, got {}",
            monthly_limit
        )));
    }
    if period_end <= period_start {
        return Err(AppError::Validation(
            "period_end must be after period_start".to_string(),
        ));
    }
    Ok(())
}

fn advance_period(
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start = period_start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AppError::Internal("period start overflow".to_string()))?;
    let end = period_end
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AppError::Internal("period end overflow".to_string()))?;
    Ok((start, end))
}

fn days_remaining(budget: &SearchBudget, now: DateTime<Utc>) -> i64 {
    (budget.period_end - now).num_days().max(0)
}

/// Fraction of the budget period already elapsed at `now`, clamped to [0, 1]
fn period_elapsed_fraction(budget: &SearchBudget, now: DateTime<Utc>) -> f64 {
    let period = (budget.period_end - budget.period_start).num_seconds();
    if period <= 0 {
        return 1.0;
    }
    let elapsed = (now - budget.period_start).num_seconds();
    (elapsed as f64 / period as f64).clamp(0.0, 1.0)
}

/// What the user "should" have spent by now if spending were spread evenly
/// over the period.
fn prorated_expectation(budget: &SearchBudget, now: DateTime<Utc>) -> Decimal {
    let fraction = period_elapsed_fraction(budget, now);
    budget.monthly_limit * Decimal::from_f64_retain(fraction).unwrap_or(Decimal::ZERO)
}

/// Trend relative to the pro-rated expectation, with a 10% tolerance band
fn classify_trend(current_spent: Decimal, expected: Decimal) -> SpendTrend {
    if expected.is_zero() {
        return if current_spent > Decimal::ZERO {
            SpendTrend::OverBudget
        } else {
            SpendTrend::OnTrack
        };
    }
    let upper = expected * Decimal::new(11, 1);
    let lower = expected * Decimal::new(9, 1);
    if current_spent > upper {
        SpendTrend::OverBudget
    } else if current_spent < lower {
        SpendTrend::UnderBudget
    } else {
        SpendTrend::OnTrack
    }
}

/// Threshold classification. Boundaries are inclusive at 90 and 75; the
/// underutilized alert needs both low usage and a half-elapsed period.
fn classify_alerts(budget: &SearchBudget, now: DateTime<Utc>) -> Vec<BudgetAlert> {
    let pct = budget.percentage_used();
    let mut alerts = Vec::new();

    if pct >= 90.0 {
        alerts.push(BudgetAlert {
            alert_type: "budget_critical".to_string(),
            severity: "high".to_string(),
            message: format!("Budget {:.1}% used", pct),
            percentage_used: pct,
        });
    } else if pct >= 75.0 {
        alerts.push(BudgetAlert {
            alert_type: "budget_warning".to_string(),
            severity: "medium".to_string(),
            message: format!("Budget {:.1}% used", pct),
            percentage_used: pct,
        });
    } else if pct < 50.0 && period_elapsed_fraction(budget, now) > 0.5 {
        alerts.push(BudgetAlert {
            alert_type: "budget_underutilized".to_string(),
            severity: "low".to_string(),
            message: format!(
                "Only {:.1}% of budget used with over half the period elapsed",
                pct
            ),
            percentage_used: pct,
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn budget(limit: i64, spent_cents: i64, start_day: u32, end_day: u32) -> SearchBudget {
        let now = Utc::now();
        SearchBudget {
            id: 1,
            user_id: 1,
            monthly_limit: Decimal::from(limit),
            current_spent: Decimal::new(spent_cents, 2),
            period_start: Utc.with_ymd_and_hms(2026, 8, start_day, 0, 0, 0).unwrap(),
            period_end: Utc.with_ymd_and_hms(2026, 9, end_day, 0, 0, 0).unwrap(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn critical_boundary_is_inclusive_at_90() {
        let mut b = budget(100, 8990, 1, 1);
        let now = b.period_start + chrono::Duration::days(10);
        // 89.9% is still only a warning
        assert_eq!(classify_alerts(&b, now)[0].alert_type, "budget_warning");

        b.current_spent = Decimal::from(90);
        let alerts = classify_alerts(&b, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, "budget_critical");
        assert_eq!(alerts[0].severity, "high");
        assert!(alerts[0].message.contains("90.0%"));
    }

    #[test]
    fn warning_band_is_75_to_90() {
        let mut b = budget(100, 7500, 1, 1);
        let now = b.period_start + chrono::Duration::days(1);
        let alerts = classify_alerts(&b, now);
        assert_eq!(alerts[0].alert_type, "budget_warning");
        assert_eq!(alerts[0].severity, "medium");

        b.current_spent = Decimal::new(8999, 2);
        let alerts = classify_alerts(&b, now);
        assert_eq!(alerts[0].alert_type, "budget_warning");
    }

    #[test]
    fn no_alert_between_50_and_75() {
        let b = budget(100, 6000, 1, 1);
        // Even with the period nearly over
        let now = b.period_end - chrono::Duration::days(1);
        assert!(classify_alerts(&b, now).is_empty());
    }

    #[test]
    fn underutilized_needs_half_elapsed_period() {
        let b = budget(100, 1000, 1, 1);

        // Early in the period: low usage is fine
        let early = b.period_start + chrono::Duration::days(2);
        assert!(classify_alerts(&b, early).is_empty());

        // Late in the period: flagged
        let late = b.period_end - chrono::Duration::days(2);
        let alerts = classify_alerts(&b, late);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, "budget_underutilized");
        assert_eq!(alerts[0].severity, "low");
    }

    #[test]
    fn trend_uses_ten_percent_band() {
        let expected = Decimal::from(50);
        assert_eq!(
            classify_trend(Decimal::from(56), expected),
            SpendTrend::OverBudget
        );
        assert_eq!(
            classify_trend(Decimal::from(55), expected),
            SpendTrend::OnTrack
        );
        assert_eq!(
            classify_trend(Decimal::from(45), expected),
            SpendTrend::OnTrack
        );
        assert_eq!(
            classify_trend(Decimal::from(44), expected),
            SpendTrend::UnderBudget
        );
    }

    #[test]
    fn trend_with_zero_expectation() {
        assert_eq!(
            classify_trend(Decimal::ZERO, Decimal::ZERO),
            SpendTrend::OnTrack
        );
        assert_eq!(
            classify_trend(Decimal::ONE, Decimal::ZERO),
            SpendTrend::OverBudget
        );
    }

    #[test]
    fn advance_period_moves_one_calendar_month() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 15, 0, 0, 0).unwrap();
        let (new_start, new_end) = advance_period(start, end).unwrap();
        assert_eq!(new_start, Utc.with_ymd_and_hms(2026, 2, 15, 0, 0, 0).unwrap());
        assert_eq!(new_end, Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap());

        // Advancing again produces a different period (not idempotent on dates)
        let (again_start, _) = advance_period(new_start, new_end).unwrap();
        assert_ne!(again_start, new_start);
    }

    #[test]
    fn advance_period_clamps_month_end() {
        let start = Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap();
        let (new_start, _) = advance_period(start, end).unwrap();
        // Jan 31 + 1 month clamps to Feb 28
        assert_eq!(new_start, Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn elapsed_fraction_clamps() {
        let b = budget(100, 0, 1, 1);
        assert_eq!(period_elapsed_fraction(&b, b.period_start - chrono::Duration::days(5)), 0.0);
        assert_eq!(period_elapsed_fraction(&b, b.period_end + chrono::Duration::days(5)), 1.0);
    }

    #[test]
    fn validation_rejects_bad_fields() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

        assert!(validate_budget_fields(Decimal::ZERO, start, end).is_err());
        assert!(validate_budget_fields(Decimal::from(-5), start, end).is_err());
        assert!(validate_budget_fields(Decimal::from(100), end, start).is_err());
        assert!(validate_budget_fields(Decimal::from(100), start, start).is_err());
        assert!(validate_budget_fields(Decimal::from(100), start, end).is_ok());
    }
}
