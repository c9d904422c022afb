//! Seam to the external search-execution engine.
//!
//! The marketplace crawl itself lives outside this service. The evaluator only
//! decides *whether* a search should run; requesting the run and reading the
//! outcome of the previous run go through this trait.

use crate::database::DatabaseManager;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Request a run of the given search
    async fn trigger(&self, search_id: i32) -> Result<(), AppError>;

    /// Result count of the search's most recent completed run, if it ever ran
    async fn last_result_count(&self, search_id: i32) -> Result<Option<i32>, AppError>;
}

/// Database-backed engine: a trigger request is recorded by stamping
/// `last_triggered_at`; the external runner polls for searches whose
/// `last_triggered_at` is newer than `last_run_at` and reports outcomes back
/// through `SavedSearchesDao::record_run`.
pub struct DatabaseSearchEngine {
    database: Arc<dyn DatabaseManager>,
}

impl DatabaseSearchEngine {
    pub fn new(database: Arc<dyn DatabaseManager>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl SearchEngine for DatabaseSearchEngine {
    async fn trigger(&self, search_id: i32) -> Result<(), AppError> {
        self.database
            .saved_searches()
            .mark_triggered(search_id, Utc::now())
            .await?;
        tracing::info!(search_id, "search run requested");
        Ok(())
    }

    async fn last_result_count(&self, search_id: i32) -> Result<Option<i32>, AppError> {
        let search = self
            .database
            .saved_searches()
            .find_by_id(search_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("search {} not found", search_id)))?;

        Ok(search.last_result_count)
    }
}

/// In-memory engine for tests: records trigger requests and serves canned
/// result counts.
pub struct MockSearchEngine {
    triggered: std::sync::Mutex<Vec<i32>>,
    counts: std::sync::Mutex<std::collections::HashMap<i32, i32>>,
}

impl MockSearchEngine {
    pub fn new() -> Self {
        Self {
            triggered: std::sync::Mutex::new(Vec::new()),
            counts: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn set_result_count(&self, search_id: i32, count: i32) {
        self.counts.lock().unwrap().insert(search_id, count);
    }

    pub fn triggered(&self) -> Vec<i32> {
        self.triggered.lock().unwrap().clone()
    }
}

impl Default for MockSearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchEngine for MockSearchEngine {
    async fn trigger(&self, search_id: i32) -> Result<(), AppError> {
        self.triggered.lock().unwrap().push(search_id);
        Ok(())
    }

    async fn last_result_count(&self, search_id: i32) -> Result<Option<i32>, AppError> {
        Ok(self.counts.lock().unwrap().get(&search_id).copied())
    }
}
