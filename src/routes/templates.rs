use crate::auth::middleware::UserExtractor;
use crate::database::entities::SearchTemplate;
use crate::error::AppError;
use crate::server::Server;
use crate::templates::{TemplateAnalytics, TemplatePreview, ValidationOutcome};
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

pub fn create_template_routes() -> Router<Server> {
    Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/categories", get(get_categories))
        .route("/templates/analytics/overview", get(get_analytics))
        .route(
            "/templates/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/templates/{id}/validate", post(validate_template))
        .route("/templates/{id}/preview", post(preview_template))
        .route("/templates/{id}/use", post(use_template))
}

#[derive(Debug, Deserialize)]
pub struct ListTemplatesQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub template_data: serde_json::Value,
    pub parameters: serde_json::Value,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub template_data: Option<serde_json::Value>,
    pub parameters: Option<serde_json::Value>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParametersRequest {
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UseTemplateRequest {
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UseTemplateResponse {
    pub search_id: i32,
}

async fn list_templates(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<Vec<SearchTemplate>>, AppError> {
    Ok(Json(
        server
            .templates
            .list(user.id, query.category.as_deref())
            .await?,
    ))
}

async fn create_template(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Json(body): Json<CreateTemplateRequest>,
) -> Result<Json<SearchTemplate>, AppError> {
    let template = server
        .templates
        .create(
            user.id,
            body.name,
            body.description,
            body.category,
            body.template_data,
            body.parameters,
            body.is_public,
        )
        .await?;
    Ok(Json(template))
}

async fn get_template(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
) -> Result<Json<SearchTemplate>, AppError> {
    Ok(Json(server.templates.get(user.id, id).await?))
}

async fn update_template(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<UpdateTemplateRequest>,
) -> Result<Json<SearchTemplate>, AppError> {
    let template = server
        .templates
        .update(
            user.id,
            id,
            body.name,
            body.description.map(Some),
            body.category,
            body.template_data,
            body.parameters,
            body.is_public,
        )
        .await?;
    Ok(Json(template))
}

async fn delete_template(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    server.templates.delete(user.id, id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}

async fn get_categories(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(server.templates.categories(user.id).await?))
}

async fn get_analytics(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<TemplateAnalytics>, AppError> {
    Ok(Json(server.templates.analytics(user.id).await?))
}

async fn validate_template(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<ParametersRequest>,
) -> Result<Json<ValidationOutcome>, AppError> {
    Ok(Json(
        server
            .templates
            .validate(user.id, id, &body.parameters)
            .await?,
    ))
}

async fn preview_template(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<ParametersRequest>,
) -> Result<Json<TemplatePreview>, AppError> {
    Ok(Json(
        server
            .templates
            .preview(user.id, id, &body.parameters)
            .await?,
    ))
}

async fn use_template(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<UseTemplateRequest>,
) -> Result<Json<UseTemplateResponse>, AppError> {
    let search_id = server
        .templates
        .use_template(user.id, id, &body.parameters, body.name)
        .await?;
    Ok(Json(UseTemplateResponse { search_id }))
}
