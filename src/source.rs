//! Source content fetching.
//!
//! The agent loop only needs the text of a project source, cut to a
//! character budget. [`FsSourceFetcher`] reads sources that an upstream
//! extraction step has already written to disk as
//! `<root>/<project_id>/sources/<source_id>.txt` (or `.md`).

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::error::SourceError;
use crate::utils::{is_safe_id, truncate_chars};

/// Extensions tried, in order, when resolving a source file.
const SOURCE_EXTENSIONS: &[&str] = &["txt", "md"];

/// Fetches the processed text of a project source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Returns at most `max_chars` characters of the source's content.
    async fn fetch(
        &self,
        project_id: &str,
        source_id: &str,
        max_chars: usize,
    ) -> Result<String, SourceError>;
}

/// Reads source text from the filesystem.
#[derive(Debug, Clone)]
pub struct FsSourceFetcher {
    root: PathBuf,
}

impl FsSourceFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding a project's sources.
    pub fn sources_dir(&self, project_id: &str) -> PathBuf {
        self.root.join(project_id).join("sources")
    }
}

#[async_trait]
impl SourceFetcher for FsSourceFetcher {
    async fn fetch(
        &self,
        project_id: &str,
        source_id: &str,
        max_chars: usize,
    ) -> Result<String, SourceError> {
        for id in [project_id, source_id] {
            if !is_safe_id(id) {
                return Err(SourceError::InvalidId(id.to_string()));
            }
        }

        let dir = self.sources_dir(project_id);
        for ext in SOURCE_EXTENSIONS {
            let path = dir.join(format!("{}.{}", source_id, ext));
            match fs::read_to_string(&path).await {
                Ok(content) => {
                    tracing::debug!(
                        path = %path.display(),
                        chars = content.chars().count(),
                        "Loaded source content"
                    );
                    return Ok(truncate_chars(&content, max_chars).to_string());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(SourceError::Io(e)),
            }
        }

        Err(SourceError::NotFound {
            project_id: project_id.to_string(),
            source_id: source_id.to_string(),
        })
    }
}
