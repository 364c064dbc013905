//! Prometheus metrics registration and export.
//!
//! This module defines all Prometheus metrics used by studio_forge and
//! provides functions for initializing, registering, and exporting them.

use prometheus::{CounterVec, Encoder, Gauge, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::{Mutex, OnceLock};

/// Serializes initialization so all statics come from the same registry.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Global Prometheus registry for all studio_forge metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Total agent runs, labeled by agent and outcome.
pub static RUNS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Model calls per run, labeled by agent.
pub static RUN_ITERATIONS: OnceLock<HistogramVec> = OnceLock::new();

/// Number of agent runs currently executing.
pub static RUNS_IN_PROGRESS: OnceLock<Gauge> = OnceLock::new();

/// Total tool calls, labeled by tool and outcome.
pub static TOOL_CALLS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Total LLM API requests, labeled by model and status.
pub static LLM_REQUESTS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// LLM API request latency in seconds, labeled by model.
pub static LLM_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Total tokens used, labeled by model and type (input/output).
pub static LLM_TOKENS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Initialize all metrics and register them with the registry.
///
/// Call once at startup. Recording before this is a no-op.
///
/// # Errors
///
/// Returns a `prometheus::Error` if metric registration fails, typically due to
/// duplicate metric names or invalid metric configurations.
///
/// # Example
///
/// ```ignore
/// use studio_forge::metrics::init_metrics;
///
/// init_metrics()?;
/// ```
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    // Run metrics
    let runs_total = CounterVec::new(
        Opts::new("studio_forge_runs_total", "Total agent runs"),
        &["agent", "outcome"],
    )?;

    let run_iterations = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "studio_forge_run_iterations",
            "Model calls made per agent run",
        )
        .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 15.0, 20.0]),
        &["agent"],
    )?;

    let runs_in_progress = Gauge::new(
        "studio_forge_runs_in_progress",
        "Number of agent runs currently executing",
    )?;

    // Tool metrics
    let tool_calls_total = CounterVec::new(
        Opts::new("studio_forge_tool_calls_total", "Total tool calls"),
        &["tool", "outcome"],
    )?;

    // LLM metrics
    let llm_requests_total = CounterVec::new(
        Opts::new("studio_forge_llm_requests_total", "Total LLM API requests"),
        &["model", "status"],
    )?;

    let llm_latency = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "studio_forge_llm_latency_seconds",
            "LLM API request latency in seconds",
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["model"],
    )?;

    let llm_tokens_total = CounterVec::new(
        Opts::new("studio_forge_llm_tokens_total", "Total tokens used"),
        &["model", "type"],
    )?;

    registry.register(Box::new(runs_total.clone()))?;
    registry.register(Box::new(run_iterations.clone()))?;
    registry.register(Box::new(runs_in_progress.clone()))?;
    registry.register(Box::new(tool_calls_total.clone()))?;
    registry.register(Box::new(llm_requests_total.clone()))?;
    registry.register(Box::new(llm_latency.clone()))?;
    registry.register(Box::new(llm_tokens_total.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = RUNS_TOTAL.set(runs_total);
    let _ = RUN_ITERATIONS.set(run_iterations);
    let _ = RUNS_IN_PROGRESS.set(runs_in_progress);
    let _ = TOOL_CALLS_TOTAL.set(tool_calls_total);
    let _ = LLM_REQUESTS_TOTAL.set(llm_requests_total);
    let _ = LLM_LATENCY.set(llm_latency);
    let _ = LLM_TOKENS_TOTAL.set(llm_tokens_total);

    tracing::info!("Prometheus metrics initialized successfully");

    Ok(())
}

/// Export all registered metrics in Prometheus text format.
///
/// If the registry has not been initialized or encoding fails, returns a
/// comment line describing the problem instead.
pub fn export_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}
