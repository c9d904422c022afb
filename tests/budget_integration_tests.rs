mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use vinyldigger_orchestrator::database::entities::SearchBudget;
use vinyldigger_orchestrator::test_utils::TestServer;

/// Decimal fields serialize as strings; parse them back for value comparison
fn dec(value: &serde_json::Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

fn period_body(limit: i64) -> serde_json::Value {
    let now = Utc::now();
    json!({
        "monthly_limit": limit,
        "period_start": (now - Duration::days(5)).to_rfc3339(),
        "period_end": (now + Duration::days(25)).to_rfc3339(),
    })
}

async fn create_budget(ctx: &TestServer, limit: i64) -> SearchBudget {
    let response = common::post(
        &ctx.app,
        "/api/budgets",
        &ctx.tokens.access_token,
        period_body(limit),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_value(common::body_json(response).await).unwrap()
}

async fn record_spend(ctx: &TestServer, budget_id: i32, amount: i64) -> SearchBudget {
    let response = common::post(
        &ctx.app,
        &format!("/api/budgets/{}/spend", budget_id),
        &ctx.tokens.access_token,
        json!({"amount": amount}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_value(common::body_json(response).await).unwrap()
}

#[tokio::test]
async fn create_budget_and_read_summary() {
    let ctx = TestServer::new().await;
    let budget = create_budget(&ctx, 100).await;

    assert!(budget.is_active);
    assert_eq!(budget.current_spent, Decimal::ZERO);
    assert_eq!(budget.monthly_limit, Decimal::from(100));

    let response = common::get(&ctx.app, "/api/budgets/summary", &ctx.tokens.access_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = common::body_json(response).await;

    assert_eq!(summary["percentage_used"], 0.0);
    assert_eq!(dec(&summary["remaining_budget"]), Decimal::from(100));
    assert!(summary["days_remaining"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn summary_without_budget_is_empty() {
    let ctx = TestServer::new().await;

    let response = common::get(&ctx.app, "/api/budgets/summary", &ctx.tokens.access_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = common::body_json(response).await;

    assert!(summary["budget"].is_null());
    assert!(summary["remaining_budget"].is_null());
    assert_eq!(summary["days_remaining"], 0);
}

#[tokio::test]
async fn spend_accumulates() {
    let ctx = TestServer::new().await;
    let budget = create_budget(&ctx, 100).await;

    let after_first = record_spend(&ctx, budget.id, 30).await;
    assert_eq!(after_first.current_spent, Decimal::from(30));

    let after_second = record_spend(&ctx, budget.id, 25).await;
    assert_eq!(after_second.current_spent, Decimal::from(55));

    let response = common::get(&ctx.app, "/api/budgets/summary", &ctx.tokens.access_token).await;
    let summary = common::body_json(response).await;
    assert_eq!(dec(&summary["spending_this_month"]), Decimal::from(55));
    assert_eq!(dec(&summary["remaining_budget"]), Decimal::from(45));
}

#[tokio::test]
async fn spend_rejects_non_positive_amounts() {
    let ctx = TestServer::new().await;
    let budget = create_budget(&ctx, 100).await;

    for amount in [0, -5] {
        let response = common::post(
            &ctx.app,
            &format!("/api/budgets/{}/spend", budget.id),
            &ctx.tokens.access_token,
            json!({"amount": amount}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn spend_on_elapsed_period_is_rejected() {
    let ctx = TestServer::new().await;
    let now = Utc::now();
    let response = common::post(
        &ctx.app,
        "/api/budgets",
        &ctx.tokens.access_token,
        json!({
            "monthly_limit": 100,
            "period_start": (now - Duration::days(60)).to_rfc3339(),
            "period_end": (now - Duration::days(30)).to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let budget: SearchBudget = serde_json::from_value(common::body_json(response).await).unwrap();

    let response = common::post(
        &ctx.app,
        &format!("/api/budgets/{}/spend", budget.id),
        &ctx.tokens.access_token,
        json!({"amount": 10}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The counter is untouched by the rejected spend
    let response = common::get(&ctx.app, "/api/budgets", &ctx.tokens.access_token).await;
    let budgets: Vec<SearchBudget> =
        serde_json::from_value(common::body_json(response).await).unwrap();
    assert_eq!(budgets[0].current_spent, Decimal::ZERO);
}

#[tokio::test]
async fn new_active_budget_deactivates_previous() {
    let ctx = TestServer::new().await;
    let first = create_budget(&ctx, 100).await;
    let second = create_budget(&ctx, 200).await;

    let response = common::get(&ctx.app, "/api/budgets", &ctx.tokens.access_token).await;
    let budgets: Vec<SearchBudget> =
        serde_json::from_value(common::body_json(response).await).unwrap();

    assert_eq!(budgets.len(), 2);
    let active: Vec<_> = budgets.iter().filter(|b| b.is_active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second.id);
    assert!(budgets.iter().any(|b| b.id == first.id && !b.is_active));
}

#[tokio::test]
async fn budget_validation_rejects_bad_fields() {
    let ctx = TestServer::new().await;
    let now = Utc::now();

    // Non-positive limit
    let response = common::post(
        &ctx.app,
        "/api/budgets",
        &ctx.tokens.access_token,
        json!({
            "monthly_limit": 0,
            "period_start": now.to_rfc3339(),
            "period_end": (now + Duration::days(30)).to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Inverted period
    let response = common::post(
        &ctx.app,
        "/api/budgets",
        &ctx.tokens.access_token,
        json!({
            "monthly_limit": 100,
            "period_start": (now + Duration::days(30)).to_rfc3339(),
            "period_end": now.to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_advances_period_each_call() {
    let ctx = TestServer::new().await;
    let budget = create_budget(&ctx, 100).await;
    record_spend(&ctx, budget.id, 40).await;

    let response =
        common::post(&ctx.app, "/api/budgets/reset", &ctx.tokens.access_token, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let after_first: SearchBudget =
        serde_json::from_value(common::body_json(response).await).unwrap();

    assert_eq!(after_first.current_spent, Decimal::ZERO);
    assert!(after_first.period_start > budget.period_start);

    // Each reset advances again; this is not idempotent on the period
    let response =
        common::post(&ctx.app, "/api/budgets/reset", &ctx.tokens.access_token, json!({})).await;
    let after_second: SearchBudget =
        serde_json::from_value(common::body_json(response).await).unwrap();
    assert!(after_second.period_start > after_first.period_start);
}

#[tokio::test]
async fn reset_without_active_budget_is_not_found() {
    let ctx = TestServer::new().await;

    let response =
        common::post(&ctx.app, "/api/budgets/reset", &ctx.tokens.access_token, json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn alert_thresholds_are_inclusive() {
    let ctx = TestServer::new().await;
    let budget = create_budget(&ctx, 100).await;

    record_spend(&ctx, budget.id, 75).await;
    let response = common::get(&ctx.app, "/api/budgets/alerts", &ctx.tokens.access_token).await;
    let alerts = common::body_json(response).await;
    assert_eq!(alerts[0]["alert_type"], "budget_warning");
    assert_eq!(alerts[0]["severity"], "medium");

    record_spend(&ctx, budget.id, 15).await;
    let response = common::get(&ctx.app, "/api/budgets/alerts", &ctx.tokens.access_token).await;
    let alerts = common::body_json(response).await;
    assert_eq!(alerts[0]["alert_type"], "budget_critical");
    assert_eq!(alerts[0]["severity"], "high");
}

#[tokio::test]
async fn analytics_requires_active_budget() {
    let ctx = TestServer::new().await;

    let response =
        common::get(&ctx.app, "/api/budgets/analytics", &ctx.tokens.access_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn analytics_sums_spend_records() {
    let ctx = TestServer::new().await;
    let budget = create_budget(&ctx, 300).await;
    record_spend(&ctx, budget.id, 20).await;
    record_spend(&ctx, budget.id, 10).await;

    let response = common::get(
        &ctx.app,
        "/api/budgets/analytics?days=7",
        &ctx.tokens.access_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let analytics = common::body_json(response).await;

    assert_eq!(dec(&analytics["total_spent"]), Decimal::from(30));
    assert!(analytics["days_elapsed"].as_i64().unwrap() >= 1);
    assert!(analytics["days_remaining"].as_i64().unwrap() > 0);
    assert!(analytics["trend"].is_string());
}

#[tokio::test]
async fn analytics_rejects_zero_day_window() {
    let ctx = TestServer::new().await;
    create_budget(&ctx, 100).await;

    let response = common::get(
        &ctx.app,
        "/api/budgets/analytics?days=0",
        &ctx.tokens.access_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn budgets_are_scoped_per_user() {
    let ctx = TestServer::new().await;
    let budget = create_budget(&ctx, 100).await;
    let (_, other_tokens) = ctx.create_user("other@example.com").await;

    // Another user cannot see or touch this budget
    let response = common::put(
        &ctx.app,
        &format!("/api/budgets/{}", budget.id),
        &other_tokens.access_token,
        json!({"monthly_limit": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = common::get(&ctx.app, "/api/budgets", &other_tokens.access_token).await;
    let budgets: Vec<SearchBudget> =
        serde_json::from_value(common::body_json(response).await).unwrap();
    assert!(budgets.is_empty());
}
