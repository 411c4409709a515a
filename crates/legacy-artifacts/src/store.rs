//! Artifact store (C10, spec §4.10): atomic write-temp-then-rename
//! persistence rooted at `<project>/docs/web_discovery/`, grounded on
//! `riptide-persistence::state::SessionSpilloverManager::spill_session`'s
//! write-then-rename pattern.

use std::path::{Path, PathBuf};

use legacy_types::analysis::{Checkpoint, ProjectMetadata};
use legacy_types::error::ArtifactError;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::instrument;

const ROOT_DIR: &str = "docs/web_discovery";

pub struct ArtifactStore {
    root: PathBuf,
    /// Serializes master-report read-modify-write cycles; reads never wait
    /// longer than a single rename (spec §4.10).
    master_report_lock: Mutex<()>,
}

impl ArtifactStore {
    /// `project_dir` is the project's working directory; artifacts live
    /// under `<project_dir>/docs/web_discovery/`.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            root: project_dir.as_ref().join(ROOT_DIR),
            master_report_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("analysis-metadata.json")
    }

    pub fn master_report_path(&self) -> PathBuf {
        self.root.join("analysis-report.md")
    }

    pub fn page_markdown_path(&self, slug: &str) -> PathBuf {
        self.root.join("pages").join(format!("page-{slug}.md"))
    }

    pub fn page_json_path(&self, slug: &str) -> PathBuf {
        self.root.join("pages").join(format!("page-{slug}.json"))
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.root.join("progress").join("checkpoint.json")
    }

    pub fn events_log_path(&self) -> PathBuf {
        self.root.join("progress").join("events.log")
    }

    pub fn report_path(&self, name: &str) -> PathBuf {
        self.root.join("reports").join(name)
    }

    /// Writes bytes to `rel_path` (relative to the store root) via a
    /// write-temp-then-rename so concurrent readers never see a partial
    /// file.
    #[instrument(skip(self, contents))]
    pub async fn write_atomic(&self, rel_path: &Path, contents: &[u8]) -> Result<(), ArtifactError> {
        let final_path = if rel_path.is_absolute() {
            rel_path.to_path_buf()
        } else {
            self.root.join(rel_path)
        };

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ArtifactError::WriteFailed {
                path: final_path.display().to_string(),
                message: e.to_string(),
            })?;
        }

        let temp_path = final_path.with_extension(match final_path.extension() {
            Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
            None => "tmp".to_string(),
        });

        fs::write(&temp_path, contents)
            .await
            .map_err(|e| ArtifactError::WriteFailed {
                path: temp_path.display().to_string(),
                message: e.to_string(),
            })?;

        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| ArtifactError::WriteFailed {
                path: final_path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    pub async fn read(&self, rel_path: &Path) -> Result<Vec<u8>, ArtifactError> {
        let full_path = if rel_path.is_absolute() {
            rel_path.to_path_buf()
        } else {
            self.root.join(rel_path)
        };
        fs::read(&full_path).await.map_err(|e| ArtifactError::ReadFailed {
            path: full_path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub async fn write_page(
        &self,
        slug: &str,
        markdown: &str,
        raw_result: &serde_json::Value,
    ) -> Result<(), ArtifactError> {
        self.write_atomic(&self.page_markdown_path(slug), markdown.as_bytes())
            .await?;
        let json_bytes = serde_json::to_vec_pretty(raw_result).map_err(|e| ArtifactError::WriteFailed {
            path: self.page_json_path(slug).display().to_string(),
            message: e.to_string(),
        })?;
        self.write_atomic(&self.page_json_path(slug), &json_bytes).await
    }

    pub async fn write_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), ArtifactError> {
        let bytes = serde_json::to_vec_pretty(checkpoint).map_err(|e| ArtifactError::WriteFailed {
            path: self.checkpoint_path().display().to_string(),
            message: e.to_string(),
        })?;
        self.write_atomic(&self.checkpoint_path(), &bytes).await
    }

    pub async fn read_checkpoint(&self) -> Result<Checkpoint, ArtifactError> {
        let bytes = self.read(&self.checkpoint_path()).await?;
        serde_json::from_slice(&bytes).map_err(|e| ArtifactError::ReadFailed {
            path: self.checkpoint_path().display().to_string(),
            message: e.to_string(),
        })
    }

    pub async fn write_metadata(&self, metadata: &ProjectMetadata) -> Result<(), ArtifactError> {
        let bytes = serde_json::to_vec_pretty(metadata).map_err(|e| ArtifactError::WriteFailed {
            path: self.metadata_path().display().to_string(),
            message: e.to_string(),
        })?;
        self.write_atomic(&self.metadata_path(), &bytes).await
    }

    /// Appends one JSON line to the append-only progress event log.
    /// Not atomic-rename based — an append never exposes a partially
    /// written prior line.
    pub async fn append_event(&self, json_line: &str) -> Result<(), ArtifactError> {
        let path = self.events_log_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ArtifactError::WriteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| ArtifactError::WriteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        file.write_all(json_line.as_bytes())
            .await
            .map_err(|e| ArtifactError::WriteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        file.write_all(b"\n").await.map_err(|e| ArtifactError::WriteFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Writes the full master-report rewrite under the advisory lock, per
    /// spec §4.10: concurrent writers serialize, readers never see more
    /// than a single rename's worth of inconsistency.
    pub async fn write_master_report(&self, contents: &str) -> Result<(), ArtifactError> {
        let _guard = self.master_report_lock.lock().await;
        self.write_atomic(&self.master_report_path(), contents.as_bytes())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_types::analysis::{Counts, QualitySummary};
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_atomic_creates_parents_and_is_readable() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.write_page("home", "# Home", &serde_json::json!({"a": 1})).await.unwrap();

        let markdown = store.read(&store.page_markdown_path("home")).await.unwrap();
        assert_eq!(markdown, b"# Home");
        assert!(!store.page_markdown_path("home").with_extension("md.tmp").exists());
    }

    #[tokio::test]
    async fn checkpoint_round_trips() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let checkpoint = Checkpoint {
            workflow_id: "wf-1".to_string(),
            created_at: chrono::Utc::now(),
            completed_pages: vec!["p1".to_string()],
            pending_pages: vec![],
            failed_pages: vec![],
            skipped_pages: vec![],
            resume_token: "tok".to_string(),
        };

        store.write_checkpoint(&checkpoint).await.unwrap();
        let read_back = store.read_checkpoint().await.unwrap();
        assert_eq!(read_back.workflow_id, "wf-1");
        assert_eq!(read_back.completed_pages, vec!["p1".to_string()]);
    }

    #[tokio::test]
    async fn append_event_accumulates_lines() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.append_event(r#"{"n":1}"#).await.unwrap();
        store.append_event(r#"{"n":2}"#).await.unwrap();

        let bytes = store.read(&store.events_log_path()).await.unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn metadata_round_trips() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let metadata = ProjectMetadata {
            project_id: "proj-1".to_string(),
            seed_url: "https://example.com".to_string(),
            domain: "example.com".to_string(),
            created_at: chrono::Utc::now(),
            settings: serde_json::json!({}),
            counts: Counts::default(),
            quality_summary: QualitySummary::default(),
        };

        store.write_metadata(&metadata).await.unwrap();
        let bytes = store.read(&store.metadata_path()).await.unwrap();
        let read_back: ProjectMetadata = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(read_back.project_id, "proj-1");
    }
}
