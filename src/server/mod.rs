use crate::{
    auth::{JwtService, JwtServiceImpl, SessionService, jwt_auth_middleware, parse_algorithm},
    budget::BudgetService,
    chains::ChainService,
    config::Config,
    database::{DatabaseManager, DatabaseManagerImpl},
    engine::{DatabaseSearchEngine, SearchEngine},
    error::AppError,
    health::HealthService,
    jobs::{ChainEvaluationJob, Job, JobScheduler, TokenCleanupJob},
    metrics,
    routes::{
        create_auth_routes, create_budget_routes, create_chain_routes, create_health_routes,
        create_protected_auth_routes, create_search_routes, create_template_routes,
    },
    shutdown::ShutdownCoordinator,
    templates::TemplateService,
};
use axum::{
    Router,
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::Response,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub database: Arc<dyn DatabaseManager>,
    pub sessions: SessionService,
    pub budgets: BudgetService,
    pub chains: ChainService,
    pub templates: TemplateService,
    pub health_service: Arc<HealthService>,
    pub shutdown_coordinator: Arc<ShutdownCoordinator>,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        Self::build(config, None).await
    }

    /// Build a server with a non-default search engine. Tests use this to
    /// substitute a mock engine.
    pub async fn new_with_engine(
        config: Config,
        engine: Arc<dyn SearchEngine>,
    ) -> Result<Self, AppError> {
        Self::build(config, Some(engine)).await
    }

    async fn build(config: Config, engine: Option<Arc<dyn SearchEngine>>) -> Result<Self, AppError> {
        if config.metrics.enabled {
            metrics::init_metrics(config.metrics.port).map_err(|e| {
                AppError::Internal(format!("Failed to start metrics server: {}", e))
            })?;
        }

        let jwt_algorithm = parse_algorithm(&config.jwt.algorithm)?;
        let jwt_service_impl = JwtServiceImpl::new(&config.jwt.secret, jwt_algorithm)?;
        let jwt: Arc<dyn JwtService> = Arc::new(jwt_service_impl.clone());

        let database_impl = Arc::new(
            DatabaseManagerImpl::new_from_config(&config)
                .await
                .map_err(AppError::Database)?,
        );
        let database: Arc<dyn DatabaseManager> = database_impl.clone();

        let engine: Arc<dyn SearchEngine> = match engine {
            Some(engine) => engine,
            None => Arc::new(DatabaseSearchEngine::new(database.clone())),
        };

        let sessions = SessionService::new(
            database.clone(),
            jwt,
            config.jwt.access_token_ttl,
            config.auth.refresh_token_ttl_days,
        );
        let budgets = BudgetService::new(database.clone());
        let chains = ChainService::new(
            database.clone(),
            engine,
            config.chains.skip_when_budget_exhausted,
        );
        let templates = TemplateService::new(database.clone());

        let health_service = Arc::new(HealthService::new());
        health_service.register(database_impl).await;
        health_service.register(jwt_service_impl.health_checker()).await;

        let shutdown_coordinator = Arc::new(ShutdownCoordinator::new());

        Ok(Self {
            config: Arc::new(config),
            database,
            sessions,
            budgets,
            chains,
            templates,
            health_service,
            shutdown_coordinator,
        })
    }

    pub async fn run(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        self.database.migrate().await.map_err(AppError::Database)?;
        info!("Database migrations completed successfully");

        let mut scheduler = JobScheduler::with_shutdown_coordinator(
            self.config.jobs.clone(),
            self.shutdown_coordinator.subscribe(),
        );
        let jobs: Vec<Arc<dyn Job>> = vec![
            Arc::new(ChainEvaluationJob::new(self.chains.clone())),
            Arc::new(TokenCleanupJob::new(self.database.clone())),
        ];
        scheduler.start(jobs).await?;

        let app = self.create_app();

        let addr = SocketAddr::from((
            self.config
                .server
                .host
                .parse::<std::net::IpAddr>()
                .map_err(|e| AppError::Internal(format!("Invalid server host: {}", e)))?,
            self.config.server.port,
        ));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}", addr);

        let shutdown_coordinator = self.shutdown_coordinator.clone();
        tokio::spawn(async move {
            shutdown_coordinator.wait_for_shutdown_signal().await;
        });

        let mut shutdown_rx = self.shutdown_coordinator.subscribe();
        let serve_result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
                info!("Graceful shutdown initiated");
            })
            .await;

        if let Err(e) = serve_result {
            error!("Server error: {}", e);
        }

        scheduler.stop().await;
        info!("Server shutdown complete");

        Ok(())
    }

    /// Creates the application router
    pub fn create_app(&self) -> Router {
        let mut app = Router::new()
            .nest("/auth", create_auth_routes())
            .nest("/auth", self.protected_auth_routes())
            .nest("/api", self.api_routes())
            .with_state(self.clone())
            .nest(
                "/health",
                create_health_routes().with_state(self.health_service.clone()),
            );

        if self.config.metrics.enabled {
            app = app.layer(middleware::from_fn(metrics::metrics_middleware));
        }
        if self.config.logging.log_request {
            app = app.layer(middleware::from_fn(request_response_logger));
        }
        app
    }

    fn protected_auth_routes(&self) -> Router<Server> {
        create_protected_auth_routes().layer(middleware::from_fn_with_state(
            self.clone(),
            jwt_auth_middleware,
        ))
    }

    fn api_routes(&self) -> Router<Server> {
        create_budget_routes()
            .merge(create_chain_routes())
            .merge(create_template_routes())
            .merge(create_search_routes())
            .layer(middleware::from_fn_with_state(
                self.clone(),
                jwt_auth_middleware,
            ))
    }
}

/// Request/response logging middleware, enabled via logging.log_request
async fn request_response_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed();

    info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        latency_ms = %duration.as_millis(),
        "request"
    );

    response
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_check_needs_no_token() {
        let ctx = crate::test_utils::TestServer::new().await;

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = ctx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_rejects_missing_token() {
        let ctx = crate::test_utils::TestServer::new().await;

        let request = Request::builder()
            .uri("/api/budgets")
            .body(Body::empty())
            .unwrap();

        let response = ctx.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
