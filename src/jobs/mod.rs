pub mod cleanup;
pub mod evaluate;
pub mod scheduler;

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cleanup::TokenCleanupJob;
pub use evaluate::ChainEvaluationJob;
pub use scheduler::JobScheduler;

/// Configuration for the job system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Enable/disable internal job scheduler
    pub enabled: bool,

    /// Chain evaluation sweep configuration
    pub chain_evaluation: ChainEvaluationConfig,

    /// Expired refresh-token cleanup configuration
    pub token_cleanup: TokenCleanupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEvaluationConfig {
    /// Cron schedule expression (6-field: sec min hour day month dow)
    pub schedule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCleanupConfig {
    /// Cron schedule expression (6-field: sec min hour day month dow)
    pub schedule: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chain_evaluation: ChainEvaluationConfig {
                schedule: "0 */15 * * * *".to_string(), // Every 15 minutes
            },
            token_cleanup: TokenCleanupConfig {
                schedule: "0 0 3 * * *".to_string(), // Daily at 3 AM
            },
        }
    }
}

/// Result of job execution
#[derive(Debug, Clone)]
pub struct JobResult {
    pub success: bool,
    pub message: String,
    pub items_processed: u64,
}

impl JobResult {
    pub fn success_with_count(count: u64) -> Self {
        Self {
            success: true,
            message: format!("Successfully processed {count} items"),
            items_processed: count,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            items_processed: 0,
        }
    }
}

/// Trait for executable jobs
#[async_trait]
pub trait Job: Send + Sync {
    /// Get the job name for logging and identification
    fn name(&self) -> &str;

    /// Execute the job and return the result
    async fn execute(&self) -> Result<JobResult, AppError>;
}
