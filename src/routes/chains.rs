use crate::auth::middleware::UserExtractor;
use crate::chains::{ChainWithLinks, EvaluationResult};
use crate::database::entities::{SearchChain, SearchChainLink, TriggerCondition};
use crate::error::AppError;
use crate::server::Server;
use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;

pub fn create_chain_routes() -> Router<Server> {
    Router::new()
        .route("/chains", get(list_chains).post(create_chain))
        .route(
            "/chains/{id}",
            get(get_chain).put(update_chain).delete(delete_chain),
        )
        .route("/chains/{id}/links", post(add_link))
        .route(
            "/chains/{id}/links/{link_id}",
            axum::routing::put(update_link).delete(delete_link),
        )
        .route("/chains/{id}/evaluate", post(evaluate_chain))
}

#[derive(Debug, Deserialize)]
pub struct CreateChainRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChainRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub search_id: i32,
    pub order_index: i32,
    #[serde(flatten)]
    pub condition: TriggerCondition,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLinkRequest {
    pub order_index: Option<i32>,
    #[serde(flatten)]
    pub condition: Option<TriggerCondition>,
}

async fn create_chain(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Json(body): Json<CreateChainRequest>,
) -> Result<Json<SearchChain>, AppError> {
    let chain = server
        .chains
        .create(user.id, &body.name, body.description.as_deref())
        .await?;
    Ok(Json(chain))
}

async fn list_chains(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<Vec<SearchChain>>, AppError> {
    Ok(Json(server.chains.list(user.id).await?))
}

async fn get_chain(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
) -> Result<Json<ChainWithLinks>, AppError> {
    Ok(Json(server.chains.get(user.id, id).await?))
}

async fn update_chain(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<UpdateChainRequest>,
) -> Result<Json<SearchChain>, AppError> {
    let chain = server
        .chains
        .update(
            user.id,
            id,
            body.name,
            body.description.map(Some),
            body.is_active,
        )
        .await?;
    Ok(Json(chain))
}

async fn delete_chain(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    server.chains.delete(user.id, id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}

async fn add_link(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
    Json(body): Json<CreateLinkRequest>,
) -> Result<Json<SearchChainLink>, AppError> {
    let link = server
        .chains
        .add_link(user.id, id, body.search_id, body.order_index, &body.condition)
        .await?;
    Ok(Json(link))
}

async fn update_link(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path((id, link_id)): Path<(i32, i32)>,
    Json(body): Json<UpdateLinkRequest>,
) -> Result<Json<SearchChainLink>, AppError> {
    let link = server
        .chains
        .update_link(
            user.id,
            id,
            link_id,
            body.order_index,
            body.condition.as_ref(),
        )
        .await?;
    Ok(Json(link))
}

async fn delete_link(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path((id, link_id)): Path<(i32, i32)>,
) -> Result<Json<serde_json::Value>, AppError> {
    server.chains.delete_link(user.id, id, link_id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}

async fn evaluate_chain(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
    Path(id): Path<i32>,
) -> Result<Json<EvaluationResult>, AppError> {
    Ok(Json(server.chains.evaluate(user.id, id).await?))
}
