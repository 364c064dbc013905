//! Execution trace archiving.
//!
//! Every handled exit of an agent run (terminal tool result or iteration
//! exhaustion) archives the transcript and outcome as an
//! [`ExecutionTrace`]. Traces are written after the job record has reached
//! its final state, so a failed save never changes the run's outcome.
//!
//! # Usage
//!
//! ```rust,ignore
//! use studio_forge::trajectory::TraceStorage;
//!
//! let storage = TraceStorage::new("/var/lib/studio-forge/traces");
//! let path = storage.save(&trace).await?;
//! for id in storage.list("marketing_strategy_agent").await? {
//!     let trace = storage.load("marketing_strategy_agent", &id).await?;
//!     println!("{} took {}s", trace.task, trace.duration_seconds());
//! }
//! ```

pub mod storage;
pub mod types;

pub use storage::TraceStorage;
pub use types::{ExecutionTrace, TraceMetadata};
