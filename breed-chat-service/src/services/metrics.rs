//! Prometheus metrics for breed-chat-service.
//!
//! One process-wide set of collectors covering HTTP traffic, model calls and
//! the session registry. Recording before [`init_metrics`] is a no-op, which
//! keeps unit tests free of global setup.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use prometheus::core::Collector;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Instant;

const HTTP_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];
const PROVIDER_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0];

static METRICS: OnceLock<Metrics> = OnceLock::new();

struct Metrics {
    registry: Registry,
    http_requests: IntCounterVec,
    http_duration: HistogramVec,
    tokens: IntCounterVec,
    model_requests: IntCounterVec,
    provider_latency: HistogramVec,
    provider_errors: IntCounterVec,
    sessions_active: IntGauge,
    sessions_evicted: IntCounterVec,
}

// Collector names and labels are static, so construction only fails on a
// programming error.
fn counter(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    IntCounterVec::new(Opts::new(name, help), labels)
        .unwrap_or_else(|e| panic!("invalid counter {}: {}", name, e))
}

fn histogram(name: &str, help: &str, buckets: &[f64], labels: &[&str]) -> HistogramVec {
    HistogramVec::new(HistogramOpts::new(name, help).buckets(buckets.to_vec()), labels)
        .unwrap_or_else(|e| panic!("invalid histogram {}: {}", name, e))
}

fn register<C: Collector + Clone + 'static>(registry: &Registry, collector: C) -> C {
    registry
        .register(Box::new(collector.clone()))
        .unwrap_or_else(|e| panic!("failed to register collector: {}", e));
    collector
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let sessions_active = IntGauge::new(
            "chat_sessions_active",
            "Number of chat sessions held in memory",
        )
        .unwrap_or_else(|e| panic!("invalid gauge chat_sessions_active: {}", e));

        Self {
            http_requests: register(
                &registry,
                counter(
                    "http_requests_total",
                    "Total number of HTTP requests",
                    &["method", "path", "status"],
                ),
            ),
            http_duration: register(
                &registry,
                histogram(
                    "http_request_duration_seconds",
                    "HTTP request duration in seconds",
                    HTTP_BUCKETS,
                    &["method", "path"],
                ),
            ),
            tokens: register(
                &registry,
                counter(
                    "genai_tokens_total",
                    "Total tokens processed",
                    &["model", "type"],
                ),
            ),
            model_requests: register(
                &registry,
                counter(
                    "genai_requests_total",
                    "Total model calls by operation and outcome",
                    &["operation", "model", "finish_reason"],
                ),
            ),
            provider_latency: register(
                &registry,
                histogram(
                    "genai_provider_latency_seconds",
                    "Model provider latency in seconds",
                    PROVIDER_BUCKETS,
                    &["provider", "model"],
                ),
            ),
            provider_errors: register(
                &registry,
                counter(
                    "genai_provider_errors_total",
                    "Total model provider errors",
                    &["provider", "error_type"],
                ),
            ),
            sessions_active: register(&registry, sessions_active),
            sessions_evicted: register(
                &registry,
                counter(
                    "chat_sessions_evicted_total",
                    "Total chat sessions removed by the eviction policy",
                    &["reason"],
                ),
            ),
            registry,
        }
    }
}

/// Install the collectors. Later calls are no-ops.
pub fn init_metrics() {
    METRICS.get_or_init(|| {
        let metrics = Metrics::new();
        tracing::info!("Prometheus metrics initialized");
        metrics
    });
}

/// Render all metrics in the Prometheus text format.
pub fn get_metrics() -> String {
    let Some(metrics) = METRICS.get() else {
        tracing::error!("Metrics registry not initialized");
        return "# Metrics registry not initialized\n".to_string();
    };

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&metrics.registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Metrics output is not UTF-8");
        format!("# Metrics output is not UTF-8: {}\n", e)
    })
}

/// Records request count and latency, labelled by the matched route so query
/// strings never widen label cardinality.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    record_http_request(
        &method,
        &path,
        response.status().as_str(),
        start.elapsed().as_secs_f64(),
    );

    response
}

pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.http_requests.with_label_values(&[method, path, status]).inc();
        m.http_duration
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

/// Token usage reported by the provider. Negative counts are ignored.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(m) = METRICS.get() {
        for (kind, count) in [("input", input_tokens), ("output", output_tokens)] {
            m.tokens
                .with_label_values(&[model, kind])
                .inc_by(count.max(0) as u64);
        }
    }
}

pub fn record_genai_request(operation: &str, model: &str, finish_reason: &str) {
    if let Some(m) = METRICS.get() {
        m.model_requests
            .with_label_values(&[operation, model, finish_reason])
            .inc();
    }
}

pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.provider_latency
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(m) = METRICS.get() {
        m.provider_errors
            .with_label_values(&[provider, error_type])
            .inc();
    }
}

pub fn set_active_sessions(count: usize) {
    if let Some(m) = METRICS.get() {
        m.sessions_active.set(count as i64);
    }
}

/// `reason` is `capacity` or `idle`.
pub fn record_sessions_evicted(reason: &str, count: usize) {
    if let Some(m) = METRICS.get() {
        m.sessions_evicted
            .with_label_values(&[reason])
            .inc_by(count as u64);
    }
}
