//! JSON-file job store.
//!
//! Each project keeps its jobs in `<root>/<project_id>/jobs.json`. Every
//! update is a read-modify-write of that index, serialized by a store-wide
//! mutex and committed with a temp-file rename so readers never observe a
//! half-written index.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{JobRecord, JobStore, JobUpdate};
use crate::error::StoreError;
use crate::utils::is_safe_id;

const INDEX_FILE: &str = "jobs.json";

/// On-disk project index.
#[derive(Debug, Default, Serialize, Deserialize)]
struct JobIndex {
    #[serde(default)]
    jobs: BTreeMap<String, JobRecord>,
}

/// Job store persisting one JSON index per project.
pub struct FileJobStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileJobStore {
    /// Creates a store rooted at `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the index file for a project.
    pub fn index_path(&self, project_id: &str) -> PathBuf {
        self.root.join(project_id).join(INDEX_FILE)
    }

    async fn read_index(&self, path: &Path) -> Result<JobIndex, StoreError> {
        match fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| StoreError::Corrupted {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(JobIndex::default()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write_index(&self, path: &Path, index: &JobIndex) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(index)?;
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn check_ids(project_id: &str, job_id: &str) -> Result<(), StoreError> {
    for id in [project_id, job_id] {
        if !is_safe_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn create(&self, record: JobRecord) -> Result<(), StoreError> {
        check_ids(&record.project_id, &record.id)?;
        let _guard = self.write_lock.lock().await;

        let path = self.index_path(&record.project_id);
        let mut index = self.read_index(&path).await?;
        if index.jobs.contains_key(&record.id) {
            return Err(StoreError::DuplicateJob {
                project_id: record.project_id,
                job_id: record.id,
            });
        }
        index.jobs.insert(record.id.clone(), record);
        self.write_index(&path, &index).await
    }

    async fn get(&self, project_id: &str, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        check_ids(project_id, job_id)?;
        let mut index = self.read_index(&self.index_path(project_id)).await?;
        Ok(index.jobs.remove(job_id))
    }

    async fn update(
        &self,
        project_id: &str,
        job_id: &str,
        update: JobUpdate,
    ) -> Result<JobRecord, StoreError> {
        check_ids(project_id, job_id)?;
        let _guard = self.write_lock.lock().await;

        let path = self.index_path(project_id);
        let mut index = self.read_index(&path).await?;
        let record = index
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::JobNotFound {
                project_id: project_id.to_string(),
                job_id: job_id.to_string(),
            })?;
        update.apply_to(record);
        let updated = record.clone();

        self.write_index(&path, &index).await?;
        Ok(updated)
    }

    async fn list(&self, project_id: &str) -> Result<Vec<JobRecord>, StoreError> {
        if !is_safe_id(project_id) {
            return Err(StoreError::InvalidId(project_id.to_string()));
        }
        let index = self.read_index(&self.index_path(project_id)).await?;
        let mut records: Vec<JobRecord> = index.jobs.into_values().collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = TempDir::new().expect("failed to create temp dir");

        let store = FileJobStore::new(dir.path());
        store
            .create(JobRecord::new("proj", "job-1", "marketing_strategy_agent"))
            .await
            .unwrap();
        store
            .update(
                "proj",
                "job-1",
                JobUpdate::new()
                    .status(JobStatus::Processing)
                    .detail("product_name", "Acme"),
            )
            .await
            .unwrap();

        let reopened = FileJobStore::new(dir.path());
        let record = reopened.get("proj", "job-1").await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Processing);
        assert_eq!(record.detail("product_name").unwrap(), "Acme");
        assert!(dir.path().join("proj").join(INDEX_FILE).exists());
    }

    #[tokio::test]
    async fn test_get_missing_project_is_none() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FileJobStore::new(dir.path());
        assert!(store.get("proj", "job").await.unwrap().is_none());
        assert!(store.list("proj").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unsafe_ids() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FileJobStore::new(dir.path());
        let err = store.create(JobRecord::new("../etc", "job", "x")).await;
        assert!(matches!(err, Err(StoreError::InvalidId(_))));
        let err = store.get("proj", "a/b").await;
        assert!(matches!(err, Err(StoreError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_update_missing_job() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FileJobStore::new(dir.path());
        let err = store.update("proj", "job", JobUpdate::new()).await;
        assert!(matches!(err, Err(StoreError::JobNotFound { .. })));
    }

    #[tokio::test]
    async fn test_corrupted_index() {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("proj")).unwrap();
        std::fs::write(dir.path().join("proj").join(INDEX_FILE), "{broken").unwrap();

        let store = FileJobStore::new(dir.path());
        let err = store.get("proj", "job").await;
        assert!(matches!(err, Err(StoreError::Corrupted { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_jobs_in_same_project() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = Arc::new(FileJobStore::new(dir.path()));

        for i in 0..8 {
            store
                .create(JobRecord::new("proj", format!("job-{}", i), "x"))
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .update(
                        "proj",
                        &format!("job-{}", i),
                        JobUpdate::new().items_written(i + 1),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let records = store.list("proj").await.unwrap();
        assert_eq!(records.len(), 8);
        for record in records {
            let n: u32 = record.id.trim_start_matches("job-").parse().unwrap();
            assert_eq!(record.items_written, n + 1);
        }
    }
}
