//! Read-only resource exposer (C14, spec §4.14):
//! `web_discovery://<project_id>/<relative_path>` resolved against the
//! artifact store root. Hand-rolled parser — the scheme is narrow enough
//! (one path segment for the project, the rest is a store-relative path)
//! that a URI-template crate would be pure overhead. Writes never go
//! through this module, only through `ArtifactStore` (C10).

use std::path::{Path, PathBuf};

use legacy_artifacts::ArtifactStore;
use legacy_types::error::ArtifactError;

pub const SCHEME: &str = "web_discovery";

#[derive(Debug, Clone)]
pub struct Resource {
    pub uri: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUri {
    pub project_id: String,
    pub relative_path: String,
}

pub fn parse_uri(uri: &str) -> Option<ResourceUri> {
    let rest = uri.strip_prefix(&format!("{SCHEME}://"))?;
    let (project_id, relative_path) = rest.split_once('/')?;
    if project_id.is_empty() || relative_path.is_empty() {
        return None;
    }
    Some(ResourceUri {
        project_id: project_id.to_string(),
        relative_path: relative_path.to_string(),
    })
}

fn mime_for(path: &str) -> &'static str {
    if path.ends_with(".md") {
        "text/markdown"
    } else if path.ends_with(".json") {
        "application/json"
    } else if path.ends_with(".log") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

/// Lists every artifact currently published under the store root: the
/// master report, the project metadata, the checkpoint, and each per-page
/// markdown/json pair — filtered to what actually exists on disk.
pub async fn list(store: &ArtifactStore) -> Result<Vec<String>, ArtifactError> {
    let mut candidates = vec![
        store.master_report_path(),
        store.metadata_path(),
        store.checkpoint_path(),
    ];

    let pages_dir = store.root().join("pages");
    if let Ok(mut entries) = tokio::fs::read_dir(&pages_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            candidates.push(entry.path());
        }
    }

    let mut uris = Vec::new();
    for path in candidates {
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            if let Some(uri) = path_to_uri(store, &path) {
                uris.push(uri);
            }
        }
    }
    Ok(uris)
}

fn path_to_uri(store: &ArtifactStore, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(store.root()).ok()?;
    Some(format!(
        "{SCHEME}://project/{}",
        relative.to_string_lossy().replace('\\', "/")
    ))
}

/// Reads one resource by uri. The project id segment is nominal (one store
/// instance already scopes one project); only `relative_path` is resolved.
pub async fn get(store: &ArtifactStore, uri: &str) -> Result<Resource, ArtifactError> {
    let parsed = parse_uri(uri).ok_or_else(|| ArtifactError::ReadFailed {
        path: uri.to_string(),
        message: "malformed web_discovery:// uri".to_string(),
    })?;

    let bytes = store.read(&PathBuf::from(&parsed.relative_path)).await?;
    Ok(Resource {
        uri: uri.to_string(),
        mime_type: mime_for(&parsed.relative_path),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_types::analysis::{Counts, ProjectMetadata, QualitySummary};
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

    #[test]
    fn parses_a_well_formed_uri() {
        let parsed = parse_uri("web_discovery://proj-1/analysis-report.md").unwrap();
        assert_eq!(parsed.project_id, "proj-1");
        assert_eq!(parsed.relative_path, "analysis-report.md");
    }

    #[test]
    fn rejects_uri_missing_a_path_segment_or_wrong_scheme() {
        assert!(parse_uri("web_discovery://proj-1").is_none());
        assert!(parse_uri("not-the-right-scheme://proj-1/x").is_none());
    }

    #[tokio::test]
    async fn get_reads_a_published_artifact() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write_metadata(&metadata()).await.unwrap();

        let resource = get(&store, "web_discovery://proj-1/analysis-metadata.json")
            .await
            .unwrap();
        assert_eq!(resource.mime_type, "application/json");
        assert!(!resource.bytes.is_empty());
    }

    #[tokio::test]
    async fn list_only_includes_artifacts_that_exist() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        assert!(list(&store).await.unwrap().is_empty());

        store.write_metadata(&metadata()).await.unwrap();
        let uris = list(&store).await.unwrap();
        assert!(uris.iter().any(|u| u.ends_with("analysis-metadata.json")));
    }
}
