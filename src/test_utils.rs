use crate::{
    auth::SessionTokens,
    config::Config,
    database::{DatabaseManager, entities::UserRecord},
    engine::MockSearchEngine,
    server::Server,
};
use axum::Router;
use std::sync::Arc;

/// Test server builder for creating test instances with in-memory backends
pub struct TestServerBuilder {
    config: Config,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.database.url = "sqlite::memory:".to_string();
        // A second pooled connection would open a second in-memory database
        config.database.max_connections = 1;
        config.jwt.secret = "test-secret".to_string();
        config.metrics.enabled = false;
        config.jobs.enabled = false;

        Self { config }
    }

    /// Set a custom configuration; in-memory overrides still apply on build
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_jwt_secret(mut self, secret: &str) -> Self {
        self.config.jwt.secret = secret.to_string();
        self
    }

    /// Build the test server with a mock search engine and a seeded user
    pub async fn build(mut self) -> TestServer {
        self.config.database.url = "sqlite::memory:".to_string();
        self.config.database.max_connections = 1;
        self.config.metrics.enabled = false;
        self.config.jobs.enabled = false;

        let engine = Arc::new(MockSearchEngine::new());
        let server = Server::new_with_engine(self.config, engine.clone())
            .await
            .unwrap();
        server.database.migrate().await.unwrap();

        let user = create_test_user(&server.database, "test@example.com").await;
        let tokens = server.sessions.issue_session(user.id).await.unwrap();

        let app = server.create_app();

        TestServer {
            server,
            app,
            engine,
            user,
            tokens,
        }
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully wired server with a seeded, authenticated user
pub struct TestServer {
    pub server: Server,
    pub app: Router,
    pub engine: Arc<MockSearchEngine>,
    pub user: UserRecord,
    pub tokens: SessionTokens,
}

impl TestServer {
    pub async fn new() -> Self {
        TestServerBuilder::new().build().await
    }

    /// `Authorization` header value for the seeded user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.tokens.access_token)
    }

    /// Seed a second user with their own session
    pub async fn create_user(&self, email: &str) -> (UserRecord, SessionTokens) {
        let user = create_test_user(&self.server.database, email).await;
        let tokens = self.server.sessions.issue_session(user.id).await.unwrap();
        (user, tokens)
    }
}

/// Create a test user in the database
pub async fn create_test_user(database: &Arc<dyn DatabaseManager>, email: &str) -> UserRecord {
    database
        .users()
        .create(email, Some("Test User"))
        .await
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_uses_memory_database() {
        let ctx = TestServer::new().await;

        assert_eq!(ctx.server.config.database.url, "sqlite::memory:");
        assert!(!ctx.server.config.metrics.enabled);
        assert!(!ctx.server.config.jobs.enabled);
    }

    #[tokio::test]
    async fn seeded_user_has_valid_session() {
        let ctx = TestServer::new().await;

        let user = ctx
            .server
            .sessions
            .authenticated_user(&ctx.tokens.access_token)
            .await
            .unwrap();
        assert_eq!(user.id, ctx.user.id);
        assert_eq!(user.email, "test@example.com");
    }

    #[tokio::test]
    async fn second_user_gets_distinct_session() {
        let ctx = TestServer::new().await;
        let (other, other_tokens) = ctx.create_user("other@example.com").await;

        assert_ne!(other.id, ctx.user.id);
        assert_ne!(other_tokens.access_token, ctx.tokens.access_token);
    }
}
