//! Artifact storage.
//!
//! Generated documents and component files are plain files on disk, laid out
//! by project, collection and job id. See [`ArtifactStore`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use studio_forge::storage::ArtifactStore;
//!
//! let store = ArtifactStore::new("/var/lib/studio-forge");
//! let path = store.job_file("proj", "marketing_strategies", "job-1", "md")?;
//! store.write_document(&path, "Launch Plan", "## Overview\n...").await?;
//! store.append_document(&path, "## Channels\n...").await?;
//! ```

pub mod artifacts;

pub use artifacts::{document_header, ArtifactStore, PART_SEPARATOR};
