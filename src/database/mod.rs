//! Database access layer with domain-specific DAOs
//!
//! This module provides direct database access without abstraction layers.
//! Each domain (budgets, chains, templates, ...) has its own DAO for focused
//! operations.

use crate::health::HealthChecker;
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use thiserror::Error;

pub mod config;
pub mod dao;
pub mod entities;
pub mod migration;

pub use dao::{
    BudgetsDao, ChainsDao, NewSavedSearch, NewTemplate, RefreshTokensDao, SavedSearchesDao,
    TemplatesDao, UsersDao,
};

/// Database error types
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Record not found")]
    NotFound,
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Migration error: {0}")]
    Migration(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database manager trait for dependency injection and testing
#[async_trait]
pub trait DatabaseManager: Send + Sync {
    /// Run database migrations
    async fn migrate(&self) -> DatabaseResult<()>;

    /// Health check for database connection
    async fn health_check(&self) -> DatabaseResult<()>;

    /// Get users DAO
    fn users(&self) -> UsersDao;

    /// Get refresh tokens DAO
    fn refresh_tokens(&self) -> RefreshTokensDao;

    /// Get saved searches DAO
    fn saved_searches(&self) -> SavedSearchesDao;

    /// Get budgets DAO
    fn budgets(&self) -> BudgetsDao;

    /// Get templates DAO
    fn templates(&self) -> TemplatesDao;

    /// Get chains DAO
    fn chains(&self) -> ChainsDao;

    /// Get direct database connection (for migrations and admin operations)
    fn connection(&self) -> &DatabaseConnection;
}

/// Database connection manager implementation
pub struct DatabaseManagerImpl {
    pub connection: DatabaseConnection,
}

impl DatabaseManagerImpl {
    /// Create database manager from configuration
    pub async fn new_from_config(config: &crate::config::Config) -> Result<Self, DatabaseError> {
        let mut options = sea_orm::ConnectOptions::new(config.database.url.clone());
        options.max_connections(config.database.max_connections);

        let connection = sea_orm::Database::connect(options)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl DatabaseManager for DatabaseManagerImpl {
    async fn migrate(&self) -> DatabaseResult<()> {
        use crate::database::migration::Migrator;
        use sea_orm_migration::MigratorTrait;

        tracing::info!("Running database migrations");

        Migrator::up(&self.connection, None)
            .await
            .map_err(|e| DatabaseError::Migration(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Successfully completed all migrations");
        Ok(())
    }

    async fn health_check(&self) -> DatabaseResult<()> {
        self.connection
            .ping()
            .await
            .map_err(|e| DatabaseError::Database(format!("db error: {}", e)))
    }

    fn users(&self) -> UsersDao {
        UsersDao::new(self.connection.clone())
    }

    fn refresh_tokens(&self) -> RefreshTokensDao {
        RefreshTokensDao::new(self.connection.clone())
    }

    fn saved_searches(&self) -> SavedSearchesDao {
        SavedSearchesDao::new(self.connection.clone())
    }

    fn budgets(&self) -> BudgetsDao {
        BudgetsDao::new(self.connection.clone())
    }

    fn templates(&self) -> TemplatesDao {
        TemplatesDao::new(self.connection.clone())
    }

    fn chains(&self) -> ChainsDao {
        ChainsDao::new(self.connection.clone())
    }

    fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

#[async_trait]
impl HealthChecker for DatabaseManagerImpl {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> crate::health::HealthCheckResult {
        match self.health_check().await {
            Ok(_) => crate::health::HealthCheckResult::healthy_with_details(serde_json::json!({
                "status": "healthy",
                "connection": "ok"
            })),
            Err(err) => crate::health::HealthCheckResult::unhealthy_with_details(
                "DB health check failed".to_string(),
                serde_json::json!({
                    "status": "unhealthy",
                    "error": err.to_string()
                }),
            ),
        }
    }
}
