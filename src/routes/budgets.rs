use crate::auth::middleware::UserExtractor;
use crate::budget::{BudgetAlert, BudgetSummary, SpendingAnalytics};
use crate::database::entities::SearchBudget;
use crate::error::AppError;
use crate::server::Server;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

pub fn create_budget_routes() -> Router<Server> {
    Router::new()
        .route("/budgets", get(list_budgets).post(create_budget))
        .route("/budgets/summary", get(get_summary))
        .route("/budgets/analytics", get(get_analytics))
        .route("/budgets/alerts", get(get_alerts))
        .route("/budgets/reset", post(reset_monthly))
        .route("/budgets/{id}", put(update_budget))
        .route("/budgets/{id}/spend", post(record_spend))
}

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    pub monthly_limit: Decimal,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    pub monthly_limit: Option<Decimal>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RecordSpendRequest {
    pub amount: Decimal,
    pub search_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    30
}

async fn create_budget(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Json(body): Json<CreateBudgetRequest>,
) -> Result<Json<SearchBudget>, AppError> {
    let budget = server
        .budgets
        .create(
            user.id,
            body.monthly_limit,
            body.period_start,
            body.period_end,
            body.is_active,
        )
        .await?;
    Ok(Json(budget))
}

async fn list_budgets(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<Vec<SearchBudget>>, AppError> {
    Ok(Json(server.budgets.list(user.id).await?))
}

async fn update_budget(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<UpdateBudgetRequest>,
) -> Result<Json<SearchBudget>, AppError> {
    let budget = server
        .budgets
        .update(
            user.id,
            id,
            body.monthly_limit,
            body.period_start,
            body.period_end,
            body.is_active,
        )
        .await?;
    Ok(Json(budget))
}

async fn record_spend(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<RecordSpendRequest>,
) -> Result<Json<SearchBudget>, AppError> {
    let budget = server
        .budgets
        .record_spend(user.id, id, body.search_id, body.amount)
        .await?;
    Ok(Json(budget))
}

async fn reset_monthly(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<SearchBudget>, AppError> {
    Ok(Json(server.budgets.reset_monthly(user.id).await?))
}

async fn get_summary(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<BudgetSummary>, AppError> {
    Ok(Json(server.budgets.summary(user.id).await?))
}

async fn get_analytics(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<SpendingAnalytics>, AppError> {
    Ok(Json(server.budgets.analytics(user.id, query.days).await?))
}

async fn get_alerts(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<Vec<BudgetAlert>>, AppError> {
    Ok(Json(server.budgets.alerts(user.id).await?))
}
