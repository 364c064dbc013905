//! Filesystem storage for generated studio artifacts.
//!
//! Artifacts live under a per-project `studio/` tree and are namespaced by
//! job id, so concurrent jobs never touch the same file:
//!
//! ```text
//! <base>/<project_id>/studio/<collection>/<job_id>.<ext>     single-file artifacts
//! <base>/<project_id>/studio/<collection>/<job_id>/<name>    multi-file artifacts
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::ArtifactError;
use crate::utils::is_safe_id;

/// Separator written after every document part.
pub const PART_SEPARATOR: &str = "\n\n";

/// Renders the header that opens a generated markdown document.
pub fn document_header(title: &str, generated_at: DateTime<Local>) -> String {
    format!(
        "# {}\n\n*Generated on {}*\n\n---\n\n",
        title,
        generated_at.format("%Y-%m-%d %H:%M")
    )
}

/// Storage for generated artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    base_path: PathBuf,
}

impl ArtifactStore {
    /// Creates a new artifact store rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the base storage path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory holding one collection of a project's artifacts.
    pub fn collection_dir(
        &self,
        project_id: &str,
        collection: &str,
    ) -> Result<PathBuf, ArtifactError> {
        check_id(project_id)?;
        Ok(self
            .base_path
            .join(project_id)
            .join("studio")
            .join(collection))
    }

    /// Path of a single-file artifact for a job.
    pub fn job_file(
        &self,
        project_id: &str,
        collection: &str,
        job_id: &str,
        extension: &str,
    ) -> Result<PathBuf, ArtifactError> {
        check_id(job_id)?;
        Ok(self
            .collection_dir(project_id, collection)?
            .join(format!("{}.{}", job_id, extension)))
    }

    /// Directory of a multi-file artifact for a job.
    pub fn job_dir(
        &self,
        project_id: &str,
        collection: &str,
        job_id: &str,
    ) -> Result<PathBuf, ArtifactError> {
        check_id(job_id)?;
        Ok(self.collection_dir(project_id, collection)?.join(job_id))
    }

    /// Ensures `dir` exists. Safe to call repeatedly.
    pub async fn ensure_dir(&self, dir: &Path) -> Result<(), ArtifactError> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| ArtifactError::DirectoryCreationFailed {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Creates (or overwrites) a markdown document with a header followed by
    /// `content` and the part separator.
    pub async fn write_document(
        &self,
        path: &Path,
        title: &str,
        content: &str,
    ) -> Result<(), ArtifactError> {
        self.ensure_parent(path).await?;

        let mut file = fs::File::create(path).await?;
        file.write_all(document_header(title, Local::now()).as_bytes())
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.write_all(PART_SEPARATOR.as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Appends `content` and the part separator to a document, creating the
    /// file if it is missing.
    pub async fn append_document(&self, path: &Path, content: &str) -> Result<(), ArtifactError> {
        self.ensure_parent(path).await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.write_all(PART_SEPARATOR.as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Writes a standalone file into `dir`, returning its full path.
    pub async fn write_file(
        &self,
        dir: &Path,
        file_name: &str,
        content: &str,
    ) -> Result<PathBuf, ArtifactError> {
        self.ensure_dir(dir).await?;
        let path = dir.join(file_name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        Ok(path)
    }

    /// Reads an artifact back as text.
    pub async fn read_to_string(&self, path: &Path) -> Result<String, ArtifactError> {
        Ok(fs::read_to_string(path).await?)
    }

    async fn ensure_parent(&self, path: &Path) -> Result<(), ArtifactError> {
        match path.parent() {
            Some(parent) => self.ensure_dir(parent).await,
            None => Ok(()),
        }
    }
}

fn check_id(id: &str) -> Result<(), ArtifactError> {
    if is_safe_id(id) {
        Ok(())
    } else {
        Err(ArtifactError::InvalidId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_document_header_format() {
        let at = Local.with_ymd_and_hms(2025, 3, 4, 9, 5, 0).unwrap();
        assert_eq!(
            document_header("Launch Plan", at),
            "# Launch Plan\n\n*Generated on 2025-03-04 09:05*\n\n---\n\n"
        );
    }

    #[test]
    fn test_paths_are_job_namespaced() {
        let store = ArtifactStore::new("/data");
        assert_eq!(
            store
                .job_file("proj", "marketing_strategies", "job-1", "md")
                .unwrap(),
            PathBuf::from("/data/proj/studio/marketing_strategies/job-1.md")
        );
        assert_eq!(
            store.job_dir("proj", "components", "job-1").unwrap(),
            PathBuf::from("/data/proj/studio/components/job-1")
        );
        assert!(matches!(
            store.job_file("proj", "x", "../job", "md"),
            Err(ArtifactError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn test_write_then_append() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = ArtifactStore::new(dir.path());
        let path = store.job_file("proj", "docs", "job", "md").unwrap();

        store.write_document(&path, "Title", "part one").await.unwrap();
        store.append_document(&path, "part two").await.unwrap();

        let text = store.read_to_string(&path).await.unwrap();
        assert!(text.starts_with("# Title\n\n*Generated on "));
        assert_eq!(text.matches("# Title").count(), 1);
        assert!(text.ends_with("---\n\npart one\n\npart two\n\n"));
    }

    #[tokio::test]
    async fn test_write_overwrites_existing_document() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = ArtifactStore::new(dir.path());
        let path = store.job_file("proj", "docs", "job", "md").unwrap();

        store.write_document(&path, "Old", "stale").await.unwrap();
        store.write_document(&path, "New", "fresh").await.unwrap();

        let text = store.read_to_string(&path).await.unwrap();
        assert!(!text.contains("stale"));
        assert!(text.contains("# New"));
    }

    #[tokio::test]
    async fn test_write_file_creates_directory() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = ArtifactStore::new(dir.path());
        let job_dir = store.job_dir("proj", "components", "job").unwrap();

        let path = store
            .write_file(&job_dir, "button.html", "<button/>")
            .await
            .unwrap();
        assert_eq!(path, job_dir.join("button.html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<button/>");

        store.ensure_dir(&job_dir).await.unwrap();
    }
}
