use crate::auth::middleware::UserExtractor;
use crate::auth::session::SessionTokens;
use crate::database::entities::UserRecord;
use crate::error::AppError;
use crate::server::Server;
use axum::{Router, extract::State, response::Json, routing::get, routing::post};
use serde::{Deserialize, Serialize};

/// Routes reachable without an access token
pub fn create_auth_routes() -> Router<Server> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_session))
}

/// Routes behind the JWT middleware
pub fn create_protected_auth_routes() -> Router<Server> {
    Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserRecord,
    #[serde(flatten)]
    pub tokens: SessionTokens,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

async fn login(
    State(server): State<Server>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (user, tokens) = server
        .sessions
        .login(&body.email, body.display_name.as_deref())
        .await?;
    Ok(Json(LoginResponse { user, tokens }))
}

async fn logout(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<serde_json::Value>, AppError> {
    let revoked = server.sessions.logout(user.id).await?;
    Ok(Json(serde_json::json!({ "revoked": revoked })))
}

async fn refresh_session(
    State(server): State<Server>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<SessionTokens>, AppError> {
    Ok(Json(server.sessions.refresh(&body.refresh_token).await?))
}

async fn me(UserExtractor(user): UserExtractor) -> Json<UserRecord> {
    Json(user)
}
