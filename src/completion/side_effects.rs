//! # Non-Critical Tasks
//!
//! Goal sync and achievement checks must never decide the outcome of a
//! workout completion. Each is wrapped as a [`NonCriticalTask`] and run by a
//! [`SideEffectRunner`], which gives every task its own error boundary: the
//! task runs on its own Tokio task, so both `Err` returns and panics are
//! caught, logged and counted, and never reach the caller.
//!
//! Dispatch is either `Inline` (awaited one after another before the request
//! continues) or `Background` (handed to the runtime and not awaited).

use std::future::Future;
use std::pin::Pin;

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use tracing::{debug, warn, Instrument};

use crate::prom_metrics::TaskLabel;

type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// How the runner executes its tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dispatch {
    #[default]
    Inline,
    Background,
}

/// A named unit of best-effort work.
pub struct NonCriticalTask {
    name: String,
    future: TaskFuture,
}

impl NonCriticalTask {
    pub fn new<F>(name: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        NonCriticalTask {
            name: name.into(),
            future: Box::pin(future),
        }
    }
}

/// Runs non-critical tasks behind individual error boundaries.
#[derive(Clone)]
pub struct SideEffectRunner {
    dispatch: Dispatch,
    failures: Family<TaskLabel, Counter>,
}

impl SideEffectRunner {
    pub fn new(dispatch: Dispatch, failures: Family<TaskLabel, Counter>) -> Self {
        SideEffectRunner { dispatch, failures }
    }

    /// Run `tasks` according to the dispatch mode. Never fails.
    pub async fn run(&self, tasks: Vec<NonCriticalTask>) {
        if tasks.is_empty() {
            return;
        }
        match self.dispatch {
            Dispatch::Inline => {
                run_isolated(tasks, self.failures.clone()).await;
            }
            Dispatch::Background => {
                let failures = self.failures.clone();
                tokio::spawn(run_isolated(tasks, failures).in_current_span());
            }
        }
    }
}

/// Run tasks sequentially, each on its own Tokio task. Returns the number
/// that failed or panicked.
async fn run_isolated(tasks: Vec<NonCriticalTask>, failures: Family<TaskLabel, Counter>) -> usize {
    let mut failed = 0;
    for task in tasks {
        let NonCriticalTask { name, future } = task;
        let outcome = tokio::spawn(future.in_current_span()).await;
        let reason = match outcome {
            Ok(Ok(())) => {
                debug!(task = %name, "non-critical task finished");
                continue;
            }
            Ok(Err(e)) => format!("{:#}", e),
            Err(join) if join.is_panic() => "task panicked".to_string(),
            Err(join) => join.to_string(),
        };
        warn!(task = %name, error = %reason, "non-critical task failed");
        failures.get_or_create(&TaskLabel { task: name }).inc();
        failed += 1;
    }
    failed
}

/// Goals tracked against workout frequency, matched case-insensitively.
pub fn is_workout_frequency_goal(title: &str) -> bool {
    let title = title.to_lowercase();
    title.contains("workout consistency") || title.contains("workouts per week")
}
