//! Chain evaluator: ordered chains of saved searches with per-link trigger
//! conditions.
//!
//! Evaluation is a single non-blocking pass over the links. Conditions read
//! the last *persisted* result count, which may be stale if the predecessor
//! was triggered in the same pass, so chains resolve eventually across
//! evaluation calls rather than in one synchronous pipeline.

use crate::database::DatabaseManager;
use crate::database::entities::{SearchChain, SearchChainLink, TriggerCondition};
use crate::engine::SearchEngine;
use crate::error::AppError;
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ChainWithLinks {
    #[serde(flatten)]
    pub chain: SearchChain,
    pub links: Vec<SearchChainLink>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluationResult {
    pub triggered_searches: Vec<i32>,
    pub count: usize,
}

/// Chain evaluator service
#[derive(Clone)]
pub struct ChainService {
    database: Arc<dyn DatabaseManager>,
    engine: Arc<dyn SearchEngine>,
    /// Per-chain evaluation locks: concurrent evaluations of one chain
    /// serialize, different chains run in parallel
    evaluation_locks: Arc<DashMap<i32, Arc<Mutex<()>>>>,
    skip_when_budget_exhausted: bool,
}

impl ChainService {
    pub fn new(
        database: Arc<dyn DatabaseManager>,
        engine: Arc<dyn SearchEngine>,
        skip_when_budget_exhausted: bool,
    ) -> Self {
        Self {
            database,
            engine,
            evaluation_locks: Arc::new(DashMap::new()),
            skip_when_budget_exhausted,
        }
    }

    pub async fn create(
        &self,
        user_id: i32,
        name: &str,
        description: Option<&str>,
    ) -> Result<SearchChain, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("chain name must not be empty".to_string()));
        }
        let chain = self.database.chains().create(user_id, name, description).await?;
        tracing::info!(user_id, chain_id = chain.id, "chain created");
        Ok(chain)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<SearchChain>, AppError> {
        Ok(self.database.chains().find_by_user(user_id).await?)
    }

    pub async fn get(&self, user_id: i32, chain_id: i32) -> Result<ChainWithLinks, AppError> {
        let chain = self.owned_chain(user_id, chain_id).await?;
        let links = self.database.chains().links_sorted(chain_id).await?;
        Ok(ChainWithLinks { chain, links })
    }

    pub async fn update(
        &self,
        user_id: i32,
        chain_id: i32,
        name: Option<String>,
        description: Option<Option<String>>,
        is_active: Option<bool>,
    ) -> Result<SearchChain, AppError> {
        self.owned_chain(user_id, chain_id).await?;
        if let Some(ref name) = name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("chain name must not be empty".to_string()));
            }
        }
        Ok(self
            .database
            .chains()
            .update(chain_id, name, description, is_active)
            .await?)
    }

    pub async fn delete(&self, user_id: i32, chain_id: i32) -> Result<(), AppError> {
        self.owned_chain(user_id, chain_id).await?;

        // Detach member searches before the links disappear
        let links = self.database.chains().links_sorted(chain_id).await?;
        for link in &links {
            self.database
                .saved_searches()
                .set_chain_membership(link.search_id, None, None)
                .await?;
        }

        self.database.chains().delete(chain_id).await?;
        self.evaluation_locks.remove(&chain_id);
        Ok(())
    }

    pub async fn add_link(
        &self,
        user_id: i32,
        chain_id: i32,
        search_id: i32,
        order_index: i32,
        condition: &TriggerCondition,
    ) -> Result<SearchChainLink, AppError> {
        self.owned_chain(user_id, chain_id).await?;

        let search = self
            .database
            .saved_searches()
            .find_by_id(search_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("search {} not found", search_id)))?;

        let links = self.database.chains().links_sorted(chain_id).await?;
        if links.iter().any(|l| l.order_index == order_index) {
            return Err(AppError::Validation(format!(
                "order_index {} already used in this chain",
                order_index
            )));
        }

        let link = self
            .database
            .chains()
            .add_link(
                chain_id,
                search.id,
                order_index,
                condition.condition_type(),
                condition.min_results(),
            )
            .await?;

        self.sync_dependencies(chain_id).await?;
        Ok(link)
    }

    pub async fn update_link(
        &self,
        user_id: i32,
        chain_id: i32,
        link_id: i32,
        order_index: Option<i32>,
        condition: Option<&TriggerCondition>,
    ) -> Result<SearchChainLink, AppError> {
        self.owned_chain(user_id, chain_id).await?;
        let links = self.database.chains().links_sorted(chain_id).await?;
        if !links.iter().any(|l| l.id == link_id) {
            return Err(AppError::NotFound(format!("link {} not found", link_id)));
        }

        if let Some(order_index) = order_index {
            if links.iter().any(|l| l.id != link_id && l.order_index == order_index) {
                return Err(AppError::Validation(format!(
                    "order_index {} already used in this chain",
                    order_index
                )));
            }
        }

        let (condition_type, min_results) = match condition {
            Some(c) => (
                Some(c.condition_type().to_string()),
                Some(c.min_results()),
            ),
            None => (None, None),
        };

        let link = self
            .database
            .chains()
            .update_link(link_id, order_index, condition_type, min_results)
            .await?;

        self.sync_dependencies(chain_id).await?;
        Ok(link)
    }

    pub async fn delete_link(
        &self,
        user_id: i32,
        chain_id: i32,
        link_id: i32,
    ) -> Result<(), AppError> {
        self.owned_chain(user_id, chain_id).await?;
        let link = self
            .database
            .chains()
            .find_link(link_id)
            .await?
            .filter(|l| l.chain_id == chain_id)
            .ok_or_else(|| AppError::NotFound(format!("link {} not found", link_id)))?;

        self.database.chains().delete_link(link_id).await?;
        self.database
            .saved_searches()
            .set_chain_membership(link.search_id, None, None)
            .await?;

        self.sync_dependencies(chain_id).await?;
        Ok(())
    }

    /// Single non-blocking evaluation pass over the chain's links in
    /// `order_index` order. Re-entrant and idempotent: a link fires at most
    /// once per completed predecessor run (`last_fired_at` marker).
    pub async fn evaluate(&self, user_id: i32, chain_id: i32) -> Result<EvaluationResult, AppError> {
        let chain = self.owned_chain(user_id, chain_id).await?;
        if !chain.is_active {
            return Err(AppError::InactiveChain(format!(
                "chain {} is inactive",
                chain_id
            )));
        }

        // Concurrent calls for the same chain queue behind this lock
        let lock = self
            .evaluation_locks
            .entry(chain_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if self.skip_when_budget_exhausted {
            let budget = self.database.budgets().find_active_for_user(chain.user_id).await?;
            if let Some(budget) = budget {
                if budget.remaining() <= rust_decimal::Decimal::ZERO {
                    tracing::warn!(chain_id, user_id, "evaluation skipped: budget exhausted");
                    return Ok(EvaluationResult {
                        triggered_searches: Vec::new(),
                        count: 0,
                    });
                }
            }
        }

        let links = self.database.chains().links_sorted(chain_id).await?;
        let mut triggered = Vec::new();

        for (position, link) in links.iter().enumerate() {
            let Some(search) = self.database.saved_searches().find_by_id(link.search_id).await?
            else {
                tracing::warn!(chain_id, link_id = link.id, "link points at a missing search");
                continue;
            };
            // Inactive searches are skipped unconditionally
            if !search.is_active {
                continue;
            }

            // The first link evaluates against its own search's last run
            let predecessor_id = if position == 0 {
                link.search_id
            } else {
                links[position - 1].search_id
            };
            let Some(predecessor) = self
                .database
                .saved_searches()
                .find_by_id(predecessor_id)
                .await?
            else {
                continue;
            };

            // Nothing to evaluate until the predecessor has completed a run
            let Some(last_run_at) = predecessor.last_run_at else {
                continue;
            };

            // Already fired for this predecessor run
            if link.last_fired_at.is_some_and(|fired| fired >= last_run_at) {
                continue;
            }

            let Some(condition) = link.trigger_condition() else {
                tracing::warn!(
                    chain_id,
                    link_id = link.id,
                    condition_type = %link.condition_type,
                    "unparseable trigger condition"
                );
                continue;
            };

            let result_count = self
                .engine
                .last_result_count(predecessor_id)
                .await?
                .unwrap_or(0);

            if condition.is_satisfied_by(result_count) {
                self.engine.trigger(link.search_id).await?;
                self.database
                    .chains()
                    .mark_link_fired(link.id, Utc::now())
                    .await?;
                triggered.push(link.search_id);

                metrics::counter!("vinyldigger_chain_links_fired_total").increment(1);
                tracing::info!(
                    chain_id,
                    link_id = link.id,
                    search_id = link.search_id,
                    result_count,
                    "chain link fired"
                );
            }
        }

        let count = triggered.len();
        Ok(EvaluationResult {
            triggered_searches: triggered,
            count,
        })
    }

    /// Evaluate every active chain (scheduler entry point). Failures on one
    /// chain never stop the sweep.
    pub async fn evaluate_all_active(&self) -> Result<usize, AppError> {
        let chains = self.database.chains().find_active().await?;
        let mut total = 0;

        for chain in chains {
            match self.evaluate(chain.user_id, chain.id).await {
                Ok(result) => total += result.count,
                Err(e) => {
                    tracing::warn!(chain_id = chain.id, error = %e, "chain evaluation failed");
                }
            }
        }

        Ok(total)
    }

    /// Rewrite each member search's chain pointer and denormalized
    /// predecessor cache from the current link order.
    async fn sync_dependencies(&self, chain_id: i32) -> Result<(), AppError> {
        let links = self.database.chains().links_sorted(chain_id).await?;

        for (position, link) in links.iter().enumerate() {
            let depends_on = if position == 0 {
                None
            } else {
                Some(links[position - 1].search_id)
            };
            self.database
                .saved_searches()
                .set_chain_membership(link.search_id, Some(chain_id), depends_on)
                .await?;
        }

        Ok(())
    }

    async fn owned_chain(&self, user_id: i32, chain_id: i32) -> Result<SearchChain, AppError> {
        let chain = self
            .database
            .chains()
            .find_by_id(chain_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("chain {} not found", chain_id)))?;

        Ok(chain)
    }
}
