use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;
use tracing::info;

/// Initialize Prometheus metrics exporter
pub fn init_metrics(port: u16) -> Result<PrometheusHandle, Box<dyn std::error::Error + Send + Sync>> {
    let builder = PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .add_global_label("service", "vinyldigger_orchestrator");

    let handle = builder.install_recorder()?;

    info!("Metrics server started on :{}/metrics", port);
    Ok(handle)
}

/// Middleware to collect HTTP request metrics
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str())
        .unwrap_or("unknown")
        .to_string();

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status.as_str().to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    gauge!("http_requests_active").decrement(1.0);

    if status.is_server_error() {
        counter!("http_errors_total", &labels[..2]).increment(1);
    }

    response
}
