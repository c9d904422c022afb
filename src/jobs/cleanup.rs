use super::{Job, JobResult};
use crate::database::DatabaseManager;
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;

/// Removes expired and revoked refresh tokens
pub struct TokenCleanupJob {
    database: Arc<dyn DatabaseManager>,
}

impl TokenCleanupJob {
    pub fn new(database: Arc<dyn DatabaseManager>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Job for TokenCleanupJob {
    fn name(&self) -> &str {
        "token_cleanup"
    }

    async fn execute(&self) -> Result<JobResult, AppError> {
        let removed = self.database.refresh_tokens().delete_expired().await?;
        Ok(JobResult::success_with_count(removed))
    }
}
