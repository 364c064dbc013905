//! Error types for studio-forge operations.
//!
//! Defines error types for each subsystem the agent loop talks to:
//! - LLM gateway interactions
//! - Prompt and tool configuration loading
//! - Job record persistence
//! - Source content fetching
//! - Artifact and execution-trace storage

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: LITELLM_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("Missing API base URL: LITELLM_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Unsupported content block: {0}")]
    UnsupportedBlock(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Context length exceeded: {limit} tokens")]
    ContextLengthExceeded { limit: u32 },

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while loading agent prompt and tool configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No prompt configuration for agent '{0}'")]
    UnknownAgent(String),

    #[error("Failed to parse configuration file '{path}': {message}")]
    ParseError { path: String, message: String },

    #[error("Missing required field '{field}' in configuration for agent '{agent}'")]
    MissingField { agent: String, field: String },

    #[error("Template rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during job record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Job '{job_id}' not found in project '{project_id}'")]
    JobNotFound { project_id: String, job_id: String },

    #[error("Job '{job_id}' already exists in project '{project_id}'")]
    DuplicateJob { project_id: String, job_id: String },

    #[error("Invalid identifier '{0}': must be non-empty and contain only alphanumeric characters, hyphens, and underscores")]
    InvalidId(String),

    #[error("Corrupted job index '{path}': {message}")]
    Corrupted { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while fetching source content.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source '{source_id}' not found in project '{project_id}'")]
    NotFound {
        project_id: String,
        source_id: String,
    },

    #[error("Invalid identifier '{0}'")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during artifact storage operations.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to create artifact directory '{path}': {reason}")]
    DirectoryCreationFailed { path: String, reason: String },

    #[error("Invalid identifier '{0}'")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while persisting execution traces.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Execution trace not found: {0}")]
    NotFound(String),

    #[error("Failed to create trace directory: {0}")]
    DirectoryCreationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
