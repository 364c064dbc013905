//! Metrics module for Prometheus-based monitoring.
//!
//! Counts agent runs, loop iterations, tool calls and LLM token usage.
//!
//! # Example
//!
//! ```ignore
//! use studio_forge::metrics::{export_metrics, init_metrics, MetricsCollector};
//!
//! init_metrics()?;
//! let collector = MetricsCollector::new();
//! collector.record_run("component_agent", "success", 2);
//! println!("{}", export_metrics());
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::MetricsCollector;
pub use self::prometheus::{export_metrics, init_metrics};

pub use self::prometheus::{
    LLM_LATENCY, LLM_REQUESTS_TOTAL, LLM_TOKENS_TOTAL, REGISTRY, RUNS_IN_PROGRESS, RUNS_TOTAL,
    RUN_ITERATIONS, TOOL_CALLS_TOTAL,
};
