use super::{Job, JobResult};
use crate::chains::ChainService;
use crate::error::AppError;
use async_trait::async_trait;

/// Periodic sweep over all active chains. Each tick is one cheap,
/// non-blocking evaluation pass; chains resolve across ticks as search runs
/// complete.
pub struct ChainEvaluationJob {
    chains: ChainService,
}

impl ChainEvaluationJob {
    pub fn new(chains: ChainService) -> Self {
        Self { chains }
    }
}

#[async_trait]
impl Job for ChainEvaluationJob {
    fn name(&self) -> &str {
        "chain_evaluation"
    }

    async fn execute(&self) -> Result<JobResult, AppError> {
        let fired = self.chains.evaluate_all_active().await?;
        Ok(JobResult::success_with_count(fired as u64))
    }
}
