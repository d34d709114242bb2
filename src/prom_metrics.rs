//! # Prometheus Metrics: Exposition for Container Orchestration
//!
//! Exposes coachhub operational metrics in the Prometheus text exposition format
//! for scraping by Prometheus, Grafana Agent, or any OpenMetrics-compatible collector.
//!
//! ## Metrics Exposed
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `coachhub_http_request_duration_seconds` | Histogram | `method`, `path` | Request latency |
//! | `coachhub_workout_completions_total` | Counter | `outcome` | Completion requests by outcome |
//! | `coachhub_side_effect_failures_total` | Counter | `task` | Failed best-effort tasks |
//!
//! The `/metrics` endpoint renders the current registry state on each scrape.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

/// Label set for HTTP latency (path already normalized).
#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct HttpLabel {
    pub method: String,
    pub path: String,
}

/// Completion outcome: `advanced`, `day_already_completed`,
/// `program_already_completed` or `failed`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct OutcomeLabel {
    pub outcome: String,
}

/// Name of a best-effort task.
#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct TaskLabel {
    pub task: String,
}

fn request_duration_histogram() -> Histogram {
    // 5ms .. ~10s
    Histogram::new(exponential_buckets(0.005, 2.0, 12))
}

/// Thread-safe metrics registry.
///
/// `Family` handles are cheap clones sharing the same underlying storage, so
/// they can be handed to components that record into them.
pub struct Metrics {
    pub registry: Registry,
    pub http_request_duration: Family<HttpLabel, Histogram, fn() -> Histogram>,
    pub workout_completions: Family<OutcomeLabel, Counter>,
    pub side_effect_failures: Family<TaskLabel, Counter>,
}

impl Metrics {
    /// Create a new metrics registry with all coachhub metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_request_duration =
            Family::<HttpLabel, Histogram, fn() -> Histogram>::new_with_constructor(
                request_duration_histogram,
            );
        registry.register(
            "coachhub_http_request_duration_seconds",
            "HTTP request latency by method and normalized path",
            http_request_duration.clone(),
        );

        let workout_completions = Family::<OutcomeLabel, Counter>::default();
        registry.register(
            "coachhub_workout_completions",
            "Workout completion requests by outcome",
            workout_completions.clone(),
        );

        let side_effect_failures = Family::<TaskLabel, Counter>::default();
        registry.register(
            "coachhub_side_effect_failures",
            "Best-effort side effects that failed",
            side_effect_failures.clone(),
        );

        Self {
            registry,
            http_request_duration,
            workout_completions,
            side_effect_failures,
        }
    }

    pub fn record_completion(&self, outcome: &str) {
        self.workout_completions
            .get_or_create(&OutcomeLabel {
                outcome: outcome.to_string(),
            })
            .inc();
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        encode(&mut buf, &self.registry).expect("encoding metrics into a String cannot fail");
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
