use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
    pub duration_ms: Option<u64>,
}

impl HealthCheckResult {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            details: None,
            duration_ms: None,
        }
    }

    pub fn healthy_with_details(details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            details: Some(details),
            duration_ms: None,
        }
    }

    pub fn degraded(message: String) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: Some(message),
            details: None,
            duration_ms: None,
        }
    }

    pub fn unhealthy(message: String) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message),
            details: None,
            duration_ms: None,
        }
    }

    pub fn unhealthy_with_details(message: String, details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message),
            details: Some(details),
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// The name of this health check component
    fn name(&self) -> &str;

    /// Perform the health check
    async fn check(&self) -> HealthCheckResult;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallHealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub checks: HashMap<String, HealthCheckResult>,
    pub summary: HealthSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total_checks: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub unhealthy_count: usize,
    pub total_duration_ms: u64,
}

pub struct HealthService {
    checkers: Arc<RwLock<HashMap<String, Arc<dyn HealthChecker>>>>,
}

impl HealthService {
    pub fn new() -> Self {
        Self {
            checkers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a health checker for a specific component
    pub async fn register(&self, checker: Arc<dyn HealthChecker>) {
        let name = checker.name().to_string();
        let mut checkers = self.checkers.write().await;
        checkers.insert(name, checker);
    }

    /// Run all health checks, or a single named one. With no filter only the
    /// liveness envelope is returned and no checker runs.
    pub async fn check_health(&self, filter: Option<&str>) -> OverallHealthResponse {
        let checkers = self.checkers.read().await;
        let mut results = HashMap::new();
        let mut total_duration = 0u64;

        let checks_to_run: Vec<_> = match filter {
            Some("all") => checkers.iter().collect(),
            Some(specific) => checkers
                .iter()
                .filter(|(name, _)| name.as_str() == specific)
                .collect(),
            None => vec![],
        };

        for (name, checker) in checks_to_run {
            let start = Instant::now();
            let mut result = checker.check().await;
            let duration = start.elapsed().as_millis() as u64;
            result = result.with_duration(duration);
            total_duration += duration;
            results.insert(name.clone(), result);
        }

        let healthy_count = results
            .values()
            .filter(|r| matches!(r.status, HealthStatus::Healthy))
            .count();
        let degraded_count = results
            .values()
            .filter(|r| matches!(r.status, HealthStatus::Degraded))
            .count();
        let unhealthy_count = results
            .values()
            .filter(|r| matches!(r.status, HealthStatus::Unhealthy))
            .count();

        // Worst status wins
        let overall_status = if unhealthy_count > 0 {
            HealthStatus::Unhealthy
        } else if degraded_count > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let summary = HealthSummary {
            total_checks: results.len(),
            healthy_count,
            degraded_count,
            unhealthy_count,
            total_duration_ms: total_duration,
        };

        OverallHealthResponse {
            status: overall_status,
            service: "vinyldigger-orchestrator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            checks: results,
            summary,
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct AlwaysHealthy;

    #[async_trait]
    impl HealthChecker for AlwaysHealthy {
        fn name(&self) -> &str {
            "always_healthy"
        }

        async fn check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy_with_details(json!({"probe": "ok"}))
        }
    }

    struct AlwaysUnhealthy;

    #[async_trait]
    impl HealthChecker for AlwaysUnhealthy {
        fn name(&self) -> &str {
            "always_unhealthy"
        }

        async fn check(&self) -> HealthCheckResult {
            HealthCheckResult::unhealthy("connection refused".to_string())
        }
    }

    #[tokio::test]
    async fn worst_status_wins() {
        let service = HealthService::new();
        service.register(Arc::new(AlwaysHealthy)).await;
        service.register(Arc::new(AlwaysUnhealthy)).await;

        let response = service.check_health(Some("all")).await;
        assert!(matches!(response.status, HealthStatus::Unhealthy));
        assert_eq!(response.summary.total_checks, 2);
        assert_eq!(response.summary.healthy_count, 1);
        assert_eq!(response.summary.unhealthy_count, 1);
    }

    #[tokio::test]
    async fn named_filter_runs_single_check() {
        let service = HealthService::new();
        service.register(Arc::new(AlwaysHealthy)).await;
        service.register(Arc::new(AlwaysUnhealthy)).await;

        let response = service.check_health(Some("always_healthy")).await;
        assert!(matches!(response.status, HealthStatus::Healthy));
        assert_eq!(response.summary.total_checks, 1);
        assert!(response.checks.contains_key("always_healthy"));
        assert!(!response.checks.contains_key("always_unhealthy"));
    }

    #[tokio::test]
    async fn liveness_runs_no_checkers() {
        let service = HealthService::new();
        service.register(Arc::new(AlwaysUnhealthy)).await;

        let response = service.check_health(None).await;
        assert!(matches!(response.status, HealthStatus::Healthy));
        assert!(response.checks.is_empty());
    }
}
