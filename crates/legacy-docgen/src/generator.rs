//! Ties per-page rendering and master-report rendering to the artifact
//! store (spec §4.13 incremental updates). After each page completes: (a)
//! the per-page markdown+JSON is written atomically, (b) the master
//! report is rewritten in full under the store's advisory lock, and (c)
//! the on-disk `pages/page-*.json` files — not in-memory state — are the
//! source of truth for that rewrite, so a regeneration after a restart
//! produces the same report a continuous run would have.

use legacy_artifacts::ArtifactStore;
use legacy_types::analysis::{ContentSummary, FeatureAnalysis, ProjectMetadata, StepOutcome};
use legacy_types::error::ArtifactError;
use tracing::instrument;

use crate::page::render_page_markdown;
use crate::report::{render_master_report, PageRecord};

pub struct DocGenerator<'a> {
    store: &'a ArtifactStore,
}

impl<'a> DocGenerator<'a> {
    pub fn new(store: &'a ArtifactStore) -> Self {
        Self { store }
    }

    /// Writes one page's markdown and raw-result JSON, then regenerates
    /// and republishes the master report from the full on-disk page set.
    #[instrument(skip(self, step1, step2, metadata))]
    pub async fn publish_page(
        &self,
        page_id: &str,
        url: &str,
        slug: &str,
        step1: StepOutcome<ContentSummary>,
        step2: StepOutcome<FeatureAnalysis>,
        metadata: &ProjectMetadata,
    ) -> Result<(), ArtifactError> {
        let markdown = render_page_markdown(page_id, url, &step1, &step2);
        let record = PageRecord {
            page_id: page_id.to_string(),
            url: url.to_string(),
            slug: slug.to_string(),
            step1,
            step2,
        };
        let raw = serde_json::to_value(&record).map_err(|e| ArtifactError::WriteFailed {
            path: self.store.page_json_path(slug).display().to_string(),
            message: e.to_string(),
        })?;

        self.store.write_page(slug, &markdown, &raw).await?;
        self.regenerate_master_report(metadata).await
    }

    /// Rebuilds `analysis-report.md` from every `pages/page-*.json` on
    /// disk, publishing the full rewrite atomically under the store's
    /// advisory lock.
    pub async fn regenerate_master_report(&self, metadata: &ProjectMetadata) -> Result<(), ArtifactError> {
        let pages = self.load_all_page_records().await?;
        let report = render_master_report(metadata, &pages);
        self.store.write_master_report(&report).await
    }

    async fn load_all_page_records(&self) -> Result<Vec<PageRecord>, ArtifactError> {
        let pages_dir = self.store.root().join("pages");
        let mut entries = match tokio::fs::read_dir(&pages_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ArtifactError::ReadFailed {
                    path: pages_dir.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| ArtifactError::ReadFailed {
            path: pages_dir.display().to_string(),
            message: e.to_string(),
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await.map_err(|e| ArtifactError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let record: PageRecord = serde_json::from_slice(&bytes).map_err(|e| ArtifactError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_types::analysis::{Counts, QualitySummary};
    use tempfile::tempdir;

    fn metadata() -> ProjectMetadata {
        ProjectMetadata {
            project_id: "proj-1".to_string(),
            seed_url: "https://example.com".to_string(),
            domain: "example.com".to_string(),
            created_at: chrono::Utc::now(),
            settings: serde_json::json!({}),
            counts: Counts::default(),
            quality_summary: QualitySummary::default(),
        }
    }

    #[tokio::test]
    async fn publish_page_writes_markdown_json_and_report() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let generator = DocGenerator::new(&store);

        generator
            .publish_page(
                "p1",
                "https://example.com/cart",
                "cart",
                StepOutcome::Skipped,
                StepOutcome::Skipped,
                &metadata(),
            )
            .await
            .unwrap();

        let markdown = store.read(&store.page_markdown_path("cart")).await.unwrap();
        assert!(String::from_utf8(markdown).unwrap().contains("cart"));

        let report = store.read(&store.master_report_path()).await.unwrap();
        let report_text = String::from_utf8(report).unwrap();
        assert!(report_text.contains("pages/page-cart.md"));
    }

    #[tokio::test]
    async fn regenerate_from_disk_survives_restart() {
        let dir = tempdir().unwrap();
        {
            let store = ArtifactStore::new(dir.path());
            let generator = DocGenerator::new(&store);
            generator
                .publish_page(
                    "p1",
                    "https://example.com/cart",
                    "cart",
                    StepOutcome::Skipped,
                    StepOutcome::Skipped,
                    &metadata(),
                )
                .await
                .unwrap();
        }

        // Simulate a fresh process picking the store back up.
        let store = ArtifactStore::new(dir.path());
        let generator = DocGenerator::new(&store);
        generator.regenerate_master_report(&metadata()).await.unwrap();

        let report = store.read(&store.master_report_path()).await.unwrap();
        assert!(String::from_utf8(report).unwrap().contains("pages/page-cart.md"));
    }
}
