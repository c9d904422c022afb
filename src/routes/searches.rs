use crate::auth::middleware::UserExtractor;
use crate::database::dao::NewSavedSearch;
use crate::database::entities::SavedSearch;
use crate::error::AppError;
use crate::server::Server;
use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

pub fn create_search_routes() -> Router<Server> {
    Router::new()
        .route("/searches", get(list_searches).post(create_search))
        .route(
            "/searches/{id}",
            get(get_search).put(update_search).delete(delete_search),
        )
        .route("/searches/{id}/runs", post(record_run))
}

#[derive(Debug, Deserialize)]
pub struct CreateSearchRequest {
    pub name: String,
    pub query: String,
    pub platform: String,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub check_interval_hours: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSearchRequest {
    pub name: Option<String>,
    pub query: Option<String>,
    pub platform: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub check_interval_hours: Option<i32>,
    pub is_active: Option<bool>,
}

/// Completed-run report from the external search runner
#[derive(Debug, Deserialize)]
pub struct RecordRunRequest {
    pub result_count: i32,
    pub ran_at: Option<DateTime<Utc>>,
}

async fn create_search(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Json(body): Json<CreateSearchRequest>,
) -> Result<Json<SavedSearch>, AppError> {
    if body.name.trim().is_empty() || body.query.trim().is_empty() {
        return Err(AppError::Validation(
            "name and query must not be empty".to_string(),
        ));
    }

    let search = server
        .database
        .saved_searches()
        .create(NewSavedSearch {
            user_id: user.id,
            name: body.name,
            query: body.query,
            platform: body.platform,
            min_price: body.min_price,
            max_price: body.max_price,
            check_interval_hours: body.check_interval_hours,
            template_id: None,
        })
        .await?;
    Ok(Json(search))
}

async fn list_searches(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<Vec<SavedSearch>>, AppError> {
    Ok(Json(
        server.database.saved_searches().find_by_user(user.id).await?,
    ))
}

async fn get_search(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
) -> Result<Json<SavedSearch>, AppError> {
    Ok(Json(owned_search(&server, user.id, id).await?))
}

async fn update_search(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<UpdateSearchRequest>,
) -> Result<Json<SavedSearch>, AppError> {
    let mut search = owned_search(&server, user.id, id).await?;

    if let Some(name) = body.name {
        search.name = name;
    }
    if let Some(query) = body.query {
        search.query = query;
    }
    if let Some(platform) = body.platform {
        search.platform = platform;
    }
    if let Some(min_price) = body.min_price {
        search.min_price = Some(min_price);
    }
    if let Some(max_price) = body.max_price {
        search.max_price = Some(max_price);
    }
    if let Some(hours) = body.check_interval_hours {
        search.check_interval_hours = Some(hours);
    }
    if let Some(is_active) = body.is_active {
        search.is_active = is_active;
    }

    Ok(Json(server.database.saved_searches().update(&search).await?))
}

async fn delete_search(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    owned_search(&server, user.id, id).await?;
    server.database.saved_searches().delete(id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}

async fn record_run(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<RecordRunRequest>,
) -> Result<Json<SavedSearch>, AppError> {
    if body.result_count < 0 {
        return Err(AppError::Validation(
            "result_count must not be negative".to_string(),
        ));
    }

    owned_search(&server, user.id, id).await?;
    let ran_at = body.ran_at.unwrap_or_else(Utc::now);
    let search = server
        .database
        .saved_searches()
        .record_run(id, ran_at, body.result_count)
        .await?;
    Ok(Json(search))
}

async fn owned_search(server: &Server, user_id: i32, id: i32) -> Result<SavedSearch, AppError> {
    server
        .database
        .saved_searches()
        .find_by_id(id)
        .await?
        .filter(|s| s.user_id == user_id)
        .ok_or_else(|| AppError::NotFound(format!("search {} not found", id)))
}
