//! Outcome of one agent run.

use serde::{Deserialize, Serialize};

use crate::llm::TokenUsage;

/// One generated component file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentArtifact {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// File name inside the job's component directory.
    pub file: String,
    pub preview_url: String,
    pub char_count: usize,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutput {
    /// A single markdown document written section by section.
    Document {
        title: String,
        file: String,
        preview_url: String,
        download_url: String,
    },
    /// A set of standalone component files.
    Components {
        category: String,
        description: String,
        components: Vec<ComponentArtifact>,
        usage_notes: String,
    },
}

/// Final result of an agent run, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Model calls made.
    pub iterations: u32,
    /// Units the loop counted as accepted.
    pub units_completed: u32,
    pub usage: TokenUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<RunOutput>,
}

impl RunResult {
    pub fn success(
        job_id: impl Into<String>,
        output: RunOutput,
        iterations: u32,
        units_completed: u32,
        usage: TokenUsage,
    ) -> Self {
        Self {
            success: true,
            job_id: job_id.into(),
            error_message: None,
            iterations,
            units_completed,
            usage,
            output: Some(output),
        }
    }

    pub fn failure(
        job_id: impl Into<String>,
        message: impl Into<String>,
        iterations: u32,
        units_completed: u32,
        usage: TokenUsage,
    ) -> Self {
        Self {
            success: false,
            job_id: job_id.into(),
            error_message: Some(message.into()),
            iterations,
            units_completed,
            usage,
            output: None,
        }
    }
}
