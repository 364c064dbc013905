//! Job records for long-running studio generations.
//!
//! A job record is the externally polled view of one generation run, keyed
//! by (project id, job id). Callers create it in the `queued` state; the
//! agent loop and its tool handlers move it through
//!
//! ```text
//! queued -> processing -> ready
//!                      \-> error
//! ```
//!
//! and fill in progress counters and planning/output fields along the way.
//! Updates are partial merges ([`JobUpdate`]), never full replacements.

pub mod file;
pub mod memory;

pub use file::FileJobStore;
pub use memory::MemoryJobStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Ready,
    Error,
}

impl JobStatus {
    /// Returns true for `ready` and `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Ready => "ready",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status and progress of one generation job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    /// Job identifier.
    pub id: String,
    /// Owning project.
    pub project_id: String,
    /// Agent that runs this job (e.g. "marketing_strategy_agent").
    pub job_type: String,
    /// Source the job was created for.
    #[serde(default)]
    pub source_id: Option<String>,
    /// Caller direction, if any.
    #[serde(default)]
    pub direction: Option<String>,

    pub status: JobStatus,
    /// Human-readable progress message.
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    /// Title of the artifact being produced.
    #[serde(default)]
    pub title: Option<String>,
    /// Items the agent planned, as accepted from the plan tool.
    #[serde(default)]
    pub planned_items: Vec<Value>,
    /// Number of planned items; 0 until a plan is accepted.
    #[serde(default)]
    pub total_items: u32,
    /// Items written so far, counted locally.
    #[serde(default)]
    pub items_written: u32,
    /// Title of the item most recently written.
    #[serde(default)]
    pub current_item: Option<String>,

    /// Artifact file name, relative to the job's artifact directory.
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,

    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,

    /// Agent-specific planning and output fields.
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl JobRecord {
    /// Create a new queued job record.
    pub fn new(
        project_id: impl Into<String>,
        job_id: impl Into<String>,
        job_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: job_id.into(),
            project_id: project_id.into(),
            job_type: job_type.into(),
            source_id: None,
            direction: None,
            status: JobStatus::Queued,
            status_message: "Queued".to_string(),
            error_message: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            title: None,
            planned_items: Vec::new(),
            total_items: 0,
            items_written: 0,
            current_item: None,
            output_file: None,
            preview_url: None,
            download_url: None,
            iterations: 0,
            input_tokens: 0,
            output_tokens: 0,
            details: Map::new(),
        }
    }

    /// Sets the source id.
    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Sets the caller direction.
    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    /// Look up an agent-specific detail field.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

/// Partial update of a job record. Only fields that are set are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub planned_items: Option<Vec<Value>>,
    pub total_items: Option<u32>,
    pub items_written: Option<u32>,
    pub current_item: Option<String>,
    pub output_file: Option<String>,
    pub preview_url: Option<String>,
    pub download_url: Option<String>,
    pub iterations: Option<u32>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    /// Merged key by key into [`JobRecord::details`].
    pub details: Map<String, Value>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn planned_items(mut self, items: Vec<Value>) -> Self {
        self.planned_items = Some(items);
        self
    }

    pub fn total_items(mut self, total: u32) -> Self {
        self.total_items = Some(total);
        self
    }

    pub fn items_written(mut self, written: u32) -> Self {
        self.items_written = Some(written);
        self
    }

    pub fn current_item(mut self, item: impl Into<String>) -> Self {
        self.current_item = Some(item.into());
        self
    }

    pub fn output_file(mut self, file: impl Into<String>) -> Self {
        self.output_file = Some(file.into());
        self
    }

    pub fn preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(url.into());
        self
    }

    pub fn download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn tokens(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self
    }

    /// Set an agent-specific detail field. `Value::Null` values are stored
    /// as-is, so optional plan fields read back as null rather than missing.
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Merge this update into `record`.
    pub fn apply_to(self, record: &mut JobRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(message) = self.status_message {
            record.status_message = message;
        }
        if let Some(message) = self.error_message {
            record.error_message = Some(message);
        }
        if let Some(at) = self.started_at {
            record.started_at = Some(at);
        }
        if let Some(at) = self.completed_at {
            record.completed_at = Some(at);
        }
        if let Some(title) = self.title {
            record.title = Some(title);
        }
        if let Some(items) = self.planned_items {
            record.planned_items = items;
        }
        if let Some(total) = self.total_items {
            record.total_items = total;
        }
        if let Some(written) = self.items_written {
            record.items_written = written;
        }
        if let Some(item) = self.current_item {
            record.current_item = Some(item);
        }
        if let Some(file) = self.output_file {
            record.output_file = Some(file);
        }
        if let Some(url) = self.preview_url {
            record.preview_url = Some(url);
        }
        if let Some(url) = self.download_url {
            record.download_url = Some(url);
        }
        if let Some(iterations) = self.iterations {
            record.iterations = iterations;
        }
        if let Some(tokens) = self.input_tokens {
            record.input_tokens = tokens;
        }
        if let Some(tokens) = self.output_tokens {
            record.output_tokens = tokens;
        }
        for (key, value) in self.details {
            record.details.insert(key, value);
        }
        record.updated_at = Utc::now();
    }
}

/// Persistent store of job records.
///
/// Writes are last-write-wins per job; concurrent writers to the same job
/// are not supported.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new record. Fails if the job already exists.
    async fn create(&self, record: JobRecord) -> Result<(), StoreError>;

    /// Fetch a record, or `None` if it does not exist.
    async fn get(&self, project_id: &str, job_id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Merge `update` into an existing record and return the result.
    async fn update(
        &self,
        project_id: &str,
        job_id: &str,
        update: JobUpdate,
    ) -> Result<JobRecord, StoreError>;

    /// All jobs of a project, oldest first.
    async fn list(&self, project_id: &str) -> Result<Vec<JobRecord>, StoreError>;
}
