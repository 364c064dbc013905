//! In-memory job store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{JobRecord, JobStore, JobUpdate};
use crate::error::StoreError;

/// Job store backed by a map in process memory. Used by tests and by
/// embedders that keep job state elsewhere.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<(String, String), JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs across all projects.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

fn key(project_id: &str, job_id: &str) -> (String, String) {
    (project_id.to_string(), job_id.to_string())
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, record: JobRecord) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let k = key(&record.project_id, &record.id);
        if jobs.contains_key(&k) {
            return Err(StoreError::DuplicateJob {
                project_id: record.project_id,
                job_id: record.id,
            });
        }
        jobs.insert(k, record);
        Ok(())
    }

    async fn get(&self, project_id: &str, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.read().await.get(&key(project_id, job_id)).cloned())
    }

    async fn update(
        &self,
        project_id: &str,
        job_id: &str,
        update: JobUpdate,
    ) -> Result<JobRecord, StoreError> {
        let mut jobs = self.jobs.write().await;
        let record = jobs
            .get_mut(&key(project_id, job_id))
            .ok_or_else(|| StoreError::JobNotFound {
                project_id: project_id.to_string(),
                job_id: job_id.to_string(),
            })?;
        update.apply_to(record);
        Ok(record.clone())
    }

    async fn list(&self, project_id: &str) -> Result<Vec<JobRecord>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut records: Vec<JobRecord> = jobs
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}
