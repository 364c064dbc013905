//! High-level recording interface over the raw Prometheus metrics.
//!
//! Every method checks whether its metric has been initialized, so callers
//! can record unconditionally whether or not `init_metrics` was called.

use super::prometheus::{
    LLM_LATENCY, LLM_REQUESTS_TOTAL, LLM_TOKENS_TOTAL, RUNS_IN_PROGRESS, RUNS_TOTAL,
    RUN_ITERATIONS, TOOL_CALLS_TOTAL,
};
use crate::llm::TokenUsage;

/// Metrics collector for agent runs.
///
/// # Example
///
/// ```ignore
/// use studio_forge::metrics::{init_metrics, MetricsCollector};
///
/// init_metrics()?;
/// let collector = MetricsCollector::new();
/// collector.run_started();
/// collector.record_tool_call("write_marketing_section", true);
/// collector.record_run("marketing_strategy_agent", "success", 4);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    /// Mark a run as started.
    pub fn run_started(&self) {
        if let Some(gauge) = RUNS_IN_PROGRESS.get() {
            gauge.inc();
        }
    }

    /// Record the end of a run.
    ///
    /// `outcome` is "success", "failure" (handled failure, including
    /// exhaustion) or "error" (unrecovered error). Errored runs carry no
    /// meaningful iteration count and are left out of the histogram.
    pub fn record_run(&self, agent: &str, outcome: &str, iterations: u32) {
        if let Some(gauge) = RUNS_IN_PROGRESS.get() {
            gauge.dec();
        }
        if let Some(runs_total) = RUNS_TOTAL.get() {
            runs_total.with_label_values(&[agent, outcome]).inc();
        }
        if outcome == "error" {
            tracing::trace!(agent, outcome, "Recorded run metric");
            return;
        }
        if let Some(run_iterations) = RUN_ITERATIONS.get() {
            run_iterations
                .with_label_values(&[agent])
                .observe(f64::from(iterations));
        }

        tracing::trace!(agent, outcome, iterations, "Recorded run metric");
    }

    /// Record one tool call.
    pub fn record_tool_call(&self, tool: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        if let Some(tool_calls) = TOOL_CALLS_TOTAL.get() {
            tool_calls.with_label_values(&[tool, outcome]).inc();
        }
    }

    /// Record one LLM API request.
    pub fn record_llm_request(
        &self,
        model: &str,
        success: bool,
        latency_secs: f64,
        tokens: TokenUsage,
    ) {
        let status = if success { "success" } else { "failure" };

        if let Some(llm_requests) = LLM_REQUESTS_TOTAL.get() {
            llm_requests.with_label_values(&[model, status]).inc();
        }
        if let Some(llm_latency) = LLM_LATENCY.get() {
            llm_latency
                .with_label_values(&[model])
                .observe(latency_secs);
        }
        if let Some(llm_tokens) = LLM_TOKENS_TOTAL.get() {
            llm_tokens
                .with_label_values(&[model, "input"])
                .inc_by(tokens.input_tokens as f64);
            llm_tokens
                .with_label_values(&[model, "output"])
                .inc_by(tokens.output_tokens as f64);
        }

        tracing::trace!(
            model,
            success,
            latency_secs,
            input_tokens = tokens.input_tokens,
            output_tokens = tokens.output_tokens,
            "Recorded LLM request metric"
        );
    }
}
