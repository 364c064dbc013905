//! Storage for execution traces.
//!
//! Traces are stored as pretty-printed JSON files grouped by agent:
//! `<base>/<agent_name>/<execution_id>.json`.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::types::ExecutionTrace;
use crate::error::TraceError;

/// Local file storage for execution traces.
#[derive(Debug, Clone)]
pub struct TraceStorage {
    /// Base path for storing trace files.
    base_path: PathBuf,
}

impl TraceStorage {
    /// Creates a new trace storage instance.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the base storage path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn agent_dir(&self, agent_name: &str) -> PathBuf {
        self.base_path.join(agent_name)
    }

    /// Returns the file path for a trace.
    pub fn trace_path(&self, agent_name: &str, id: &Uuid) -> PathBuf {
        self.agent_dir(agent_name).join(format!("{}.json", id))
    }

    async fn ensure_directory(&self, dir: &Path) -> Result<(), TraceError> {
        if !dir.exists() {
            fs::create_dir_all(dir).await.map_err(|e| {
                TraceError::DirectoryCreationFailed(format!(
                    "Failed to create directory {:?}: {}",
                    dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Saves a trace and returns the path it was written to.
    pub async fn save(&self, trace: &ExecutionTrace) -> Result<PathBuf, TraceError> {
        self.ensure_directory(&self.agent_dir(&trace.agent_name))
            .await?;

        let path = self.trace_path(&trace.agent_name, &trace.execution_id);
        let json = serde_json::to_string_pretty(trace)?;

        let mut file = fs::File::create(&path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;

        Ok(path)
    }

    /// Loads a trace.
    pub async fn load(&self, agent_name: &str, id: &Uuid) -> Result<ExecutionTrace, TraceError> {
        let path = self.trace_path(agent_name, id);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TraceError::NotFound(id.to_string()))
            }
            Err(e) => return Err(TraceError::Io(e)),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Lists the ids of all traces stored for an agent.
    pub async fn list(&self, agent_name: &str) -> Result<Vec<Uuid>, TraceError> {
        let dir = self.agent_dir(agent_name);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(id) = Uuid::parse_str(stem) {
                    ids.push(id);
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Loads every trace of an agent that belongs to `job_id`, oldest first.
    pub async fn find_by_job(
        &self,
        agent_name: &str,
        job_id: &str,
    ) -> Result<Vec<ExecutionTrace>, TraceError> {
        let mut traces = Vec::new();
        for id in self.list(agent_name).await? {
            let trace = self.load(agent_name, &id).await?;
            if trace.metadata.job_id == job_id {
                traces.push(trace);
            }
        }
        traces.sort_by_key(|t| t.started_at);
        Ok(traces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, TokenUsage};
    use crate::scaffold::RunResult;
    use crate::trajectory::types::TraceMetadata;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_trace(agent: &str, job_id: &str) -> ExecutionTrace {
        ExecutionTrace {
            execution_id: Uuid::new_v4(),
            agent_name: agent.to_string(),
            task: "Marketing strategy for source src-1".to_string(),
            model: "test-model".to_string(),
            messages: vec![Message::user("hello")],
            result: RunResult::failure(job_id, "stopped", 10, 2, TokenUsage::new(5, 5)),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            metadata: TraceMetadata {
                project_id: "proj".to_string(),
                job_id: job_id.to_string(),
                source_id: "src-1".to_string(),
                iterations: 10,
                units_completed: 2,
                usage: TokenUsage::new(5, 5),
            },
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = TraceStorage::new(temp_dir.path());

        let trace = create_test_trace("marketing_strategy_agent", "job-1");
        let path = storage.save(&trace).await.expect("Save should succeed");
        assert!(path.exists());
        assert!(path.starts_with(temp_dir.path().join("marketing_strategy_agent")));

        let loaded = storage
            .load("marketing_strategy_agent", &trace.execution_id)
            .await
            .expect("Load should succeed");
        assert_eq!(loaded.metadata, trace.metadata);
        assert_eq!(loaded.messages, trace.messages);
        assert_eq!(loaded.result, trace.result);
    }

    #[tokio::test]
    async fn test_load_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = TraceStorage::new(temp_dir.path());
        let result = storage.load("component_agent", &Uuid::new_v4()).await;
        assert!(matches!(result, Err(TraceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_and_find_by_job() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = TraceStorage::new(temp_dir.path());

        assert!(storage.list("component_agent").await.unwrap().is_empty());

        for job in ["job-a", "job-b", "job-a"] {
            storage
                .save(&create_test_trace("component_agent", job))
                .await
                .expect("Save should succeed");
        }
        storage
            .save(&create_test_trace("marketing_strategy_agent", "job-a"))
            .await
            .expect("Save should succeed");

        assert_eq!(storage.list("component_agent").await.unwrap().len(), 3);
        let found = storage
            .find_by_job("component_agent", "job-a")
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|t| t.metadata.job_id == "job-a"));
    }
}
