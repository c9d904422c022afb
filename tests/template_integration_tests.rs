mod common;

use axum::http::StatusCode;
use serde_json::json;
use vinyldigger_orchestrator::database::entities::{SavedSearch, SearchTemplate};
use vinyldigger_orchestrator::test_utils::TestServer;

fn vinyl_template_body() -> serde_json::Value {
    json!({
        "name": "Artist vinyl hunt",
        "category": "vinyl",
        "template_data": {
            "query": "{artist} {format} vinyl",
            "platform": "discogs",
            "max_price": 50
        },
        "parameters": {
            "artist": {"type": "string", "required": true},
            "format": {"type": "string", "required": false, "default": "LP"}
        }
    })
}

async fn create_template(ctx: &TestServer, body: serde_json::Value) -> SearchTemplate {
    let response = common::post(&ctx.app, "/api/templates", &ctx.tokens.access_token, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_value(common::body_json(response).await).unwrap()
}

#[tokio::test]
async fn validate_reports_issues_without_failing() {
    let ctx = TestServer::new().await;
    let template = create_template(&ctx, vinyl_template_body()).await;

    // Missing required parameter
    let response = common::post(
        &ctx.app,
        &format!("/api/templates/{}/validate", template.id),
        &ctx.tokens.access_token,
        json!({"parameters": {}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = common::body_json(response).await;
    assert_eq!(outcome["valid"], false);
    let issues = outcome["issues"].as_array().unwrap();
    assert!(issues.iter().any(|i| i.as_str().unwrap().contains("artist")));

    // Wrong type and unknown parameter
    let response = common::post(
        &ctx.app,
        &format!("/api/templates/{}/validate", template.id),
        &ctx.tokens.access_token,
        json!({"parameters": {"artist": 42, "color": "red"}}),
    )
    .await;
    let outcome = common::body_json(response).await;
    assert_eq!(outcome["valid"], false);
    let issues = outcome["issues"].as_array().unwrap();
    assert!(issues.iter().any(|i| i.as_str().unwrap().contains("artist")));
    assert!(issues.iter().any(|i| i.as_str().unwrap().contains("color")));

    // Everything supplied correctly
    let response = common::post(
        &ctx.app,
        &format!("/api/templates/{}/validate", template.id),
        &ctx.tokens.access_token,
        json!({"parameters": {"artist": "Miles Davis"}}),
    )
    .await;
    let outcome = common::body_json(response).await;
    assert_eq!(outcome["valid"], true);
    assert!(outcome["issues"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn validate_flags_undeclared_placeholder() {
    let ctx = TestServer::new().await;
    let template = create_template(
        &ctx,
        json!({
            "name": "Broken",
            "category": "vinyl",
            "template_data": {"query": "{artist} {year}", "platform": "discogs"},
            "parameters": {"artist": {"type": "string", "required": true}}
        }),
    )
    .await;

    let response = common::post(
        &ctx.app,
        &format!("/api/templates/{}/validate", template.id),
        &ctx.tokens.access_token,
        json!({"parameters": {"artist": "Nina Simone"}}),
    )
    .await;
    let outcome = common::body_json(response).await;
    assert_eq!(outcome["valid"], false);
    let issues = outcome["issues"].as_array().unwrap();
    assert!(issues.iter().any(|i| i.as_str().unwrap().contains("year")));
}

#[tokio::test]
async fn preview_substitutes_parameters_and_defaults() {
    let ctx = TestServer::new().await;
    let template = create_template(&ctx, vinyl_template_body()).await;

    let response = common::post(
        &ctx.app,
        &format!("/api/templates/{}/preview", template.id),
        &ctx.tokens.access_token,
        json!({"parameters": {"artist": "Miles Davis"}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let preview = common::body_json(response).await;

    // The missing optional falls back to its default
    assert_eq!(preview["query"], "Miles Davis LP vinyl");
    assert_eq!(preview["platform"], "discogs");
}

#[tokio::test]
async fn preview_renders_missing_optional_as_empty() {
    let ctx = TestServer::new().await;
    let template = create_template(
        &ctx,
        json!({
            "name": "Optional",
            "category": "vinyl",
            "template_data": {"query": "{artist} {label}", "platform": "discogs"},
            "parameters": {
                "artist": {"type": "string", "required": true},
                "label": {"type": "string", "required": false}
            }
        }),
    )
    .await;

    let response = common::post(
        &ctx.app,
        &format!("/api/templates/{}/preview", template.id),
        &ctx.tokens.access_token,
        json!({"parameters": {"artist": "Nina Simone"}}),
    )
    .await;
    let preview = common::body_json(response).await;
    assert_eq!(preview["query"], "Nina Simone ");
}

#[tokio::test]
async fn use_template_creates_search_and_counts_usage() {
    let ctx = TestServer::new().await;
    let template = create_template(&ctx, vinyl_template_body()).await;
    assert_eq!(template.usage_count, 0);

    let response = common::post(
        &ctx.app,
        &format!("/api/templates/{}/use", template.id),
        &ctx.tokens.access_token,
        json!({"parameters": {"artist": "Miles Davis", "format": "12\""}, "name": "Miles hunt"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let search_id = body["search_id"].as_i64().unwrap() as i32;

    let response = common::get(
        &ctx.app,
        &format!("/api/searches/{}", search_id),
        &ctx.tokens.access_token,
    )
    .await;
    let search: SavedSearch = serde_json::from_value(common::body_json(response).await).unwrap();
    assert_eq!(search.name, "Miles hunt");
    assert_eq!(search.query, "Miles Davis 12\" vinyl");
    assert_eq!(search.template_id, Some(template.id));

    let response = common::get(
        &ctx.app,
        &format!("/api/templates/{}", template.id),
        &ctx.tokens.access_token,
    )
    .await;
    let template: SearchTemplate =
        serde_json::from_value(common::body_json(response).await).unwrap();
    assert_eq!(template.usage_count, 1);
}

#[tokio::test]
async fn use_template_with_invalid_parameters_is_rejected() {
    let ctx = TestServer::new().await;
    let template = create_template(&ctx, vinyl_template_body()).await;

    let response = common::post(
        &ctx.app,
        &format!("/api/templates/{}/use", template.id),
        &ctx.tokens.access_token,
        json!({"parameters": {}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was created or counted
    let response = common::get(&ctx.app, "/api/searches", &ctx.tokens.access_token).await;
    let searches: Vec<SavedSearch> =
        serde_json::from_value(common::body_json(response).await).unwrap();
    assert!(searches.is_empty());
}

#[tokio::test]
async fn private_templates_stay_private() {
    let ctx = TestServer::new().await;
    let (_, other_tokens) = ctx.create_user("other@example.com").await;

    let response = common::post(
        &ctx.app,
        "/api/templates",
        &other_tokens.access_token,
        json!({
            "name": "Their secret",
            "category": "vinyl",
            "template_data": {"query": "{artist}", "platform": "discogs"},
            "parameters": {"artist": {"type": "string", "required": true}},
            "is_public": false
        }),
    )
    .await;
    let private: SearchTemplate = serde_json::from_value(common::body_json(response).await).unwrap();

    let response = common::get(
        &ctx.app,
        &format!("/api/templates/{}", private.id),
        &ctx.tokens.access_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = common::get(&ctx.app, "/api/templates", &ctx.tokens.access_token).await;
    let visible: Vec<SearchTemplate> =
        serde_json::from_value(common::body_json(response).await).unwrap();
    assert!(visible.iter().all(|t| t.id != private.id));
}

#[tokio::test]
async fn public_templates_are_visible_but_not_editable() {
    let ctx = TestServer::new().await;
    let (_, other_tokens) = ctx.create_user("other@example.com").await;

    let response = common::post(
        &ctx.app,
        "/api/templates",
        &other_tokens.access_token,
        json!({
            "name": "Shared",
            "category": "vinyl",
            "template_data": {"query": "{artist}", "platform": "discogs"},
            "parameters": {"artist": {"type": "string", "required": true}},
            "is_public": true
        }),
    )
    .await;
    let shared: SearchTemplate = serde_json::from_value(common::body_json(response).await).unwrap();

    let response = common::get(
        &ctx.app,
        &format!("/api/templates/{}", shared.id),
        &ctx.tokens.access_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Visible is not editable
    let response = common::put(
        &ctx.app,
        &format!("/api/templates/{}", shared.id),
        &ctx.tokens.access_token,
        json!({"name": "Hijacked"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = common::delete(
        &ctx.app,
        &format!("/api/templates/{}", shared.id),
        &ctx.tokens.access_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn categories_are_distinct() {
    let ctx = TestServer::new().await;
    for (name, category) in [("a", "vinyl"), ("b", "vinyl"), ("c", "cd")] {
        create_template(
            &ctx,
            json!({
                "name": name,
                "category": category,
                "template_data": {"query": "{artist}", "platform": "discogs"},
                "parameters": {"artist": {"type": "string", "required": true}}
            }),
        )
        .await;
    }

    let response = common::get(
        &ctx.app,
        "/api/templates/categories",
        &ctx.tokens.access_token,
    )
    .await;
    let categories: Vec<String> =
        serde_json::from_value(common::body_json(response).await).unwrap();
    assert_eq!(categories.len(), 2);
    assert!(categories.contains(&"vinyl".to_string()));
    assert!(categories.contains(&"cd".to_string()));
}

#[tokio::test]
async fn categories_respect_template_visibility() {
    let ctx = TestServer::new().await;
    let (_, other_tokens) = ctx.create_user("other@example.com").await;

    // Another user's private category must stay invisible; their public one shows
    for (name, category, is_public) in [("hidden", "rarities", false), ("shared", "cd", true)] {
        let response = common::post(
            &ctx.app,
            "/api/templates",
            &other_tokens.access_token,
            json!({
                "name": name,
                "category": category,
                "template_data": {"query": "{artist}", "platform": "discogs"},
                "parameters": {"artist": {"type": "string", "required": true}},
                "is_public": is_public
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    create_template(&ctx, vinyl_template_body()).await;

    let response = common::get(
        &ctx.app,
        "/api/templates/categories",
        &ctx.tokens.access_token,
    )
    .await;
    let categories: Vec<String> =
        serde_json::from_value(common::body_json(response).await).unwrap();

    assert!(categories.contains(&"vinyl".to_string()));
    assert!(categories.contains(&"cd".to_string()));
    assert!(!categories.contains(&"rarities".to_string()));
}

#[tokio::test]
async fn analytics_track_usage() {
    let ctx = TestServer::new().await;
    let template = create_template(&ctx, vinyl_template_body()).await;

    for _ in 0..2 {
        let response = common::post(
            &ctx.app,
            &format!("/api/templates/{}/use", template.id),
            &ctx.tokens.access_token,
            json!({"parameters": {"artist": "Fela Kuti"}}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = common::get(
        &ctx.app,
        "/api/templates/analytics/overview",
        &ctx.tokens.access_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let analytics = common::body_json(response).await;

    assert_eq!(analytics["total_templates"], 1);
    assert_eq!(analytics["total_uses"], 2);
    assert_eq!(analytics["top_templates"][0]["id"], template.id);
    assert_eq!(analytics["top_templates"][0]["usage_count"], 2);
}

#[tokio::test]
async fn malformed_schema_is_rejected_at_creation() {
    let ctx = TestServer::new().await;

    let response = common::post(
        &ctx.app,
        "/api/templates",
        &ctx.tokens.access_token,
        json!({
            "name": "Bad",
            "category": "vinyl",
            "template_data": {"query": "{artist}", "platform": "discogs"},
            "parameters": {"artist": {"type": "datetime", "required": true}}
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
