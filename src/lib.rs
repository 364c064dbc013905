//! studio-forge: plan-then-write LLM agents for studio artifacts.
//!
//! An agent plans a multi-part artifact (a document or a set of components)
//! and then writes it one tool call at a time, inside a bounded tool-calling
//! loop that drives a polled job record from `queued` to `ready` or `error`.

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod llm;
pub mod metrics;
pub mod scaffold;
pub mod source;
pub mod storage;
pub mod trajectory;
pub mod utils;

// Re-export commonly used error types
pub use error::{ArtifactError, ConfigError, LlmError, SourceError, StoreError, TraceError};
