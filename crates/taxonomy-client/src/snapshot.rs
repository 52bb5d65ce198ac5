// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Snapshot-backed backend used by the mock service and the gateway's
//! offline mode.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taxonomy_model::{TaxonomyResponse, TaxonomyTree};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::backend::{BackendError, TaxonomyBackend};

/// Id of the tree served when the snapshot file does not exist.
pub const PLACEHOLDER_TAXONOMY_ID: &str = "mock-taxonomy-id";
/// Name of the tree served when the snapshot file does not exist.
pub const PLACEHOLDER_TAXONOMY_NAME: &str = "Mock Taxonomy";

/// Snapshot could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The file exists but could not be read.
    #[error("reading snapshot {}: {source}", .path.display())]
    Read {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file is not a valid `GetTaxonomyById` response.
    #[error("parsing snapshot {}: {source}", .path.display())]
    Parse {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Load a JSON-encoded `GetTaxonomyById` response from `path`.
///
/// A missing file is not an error: it yields an empty placeholder tree
/// ([`PLACEHOLDER_TAXONOMY_ID`], [`PLACEHOLDER_TAXONOMY_NAME`]). Any other
/// read failure, and any parse failure, is.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Arc<TaxonomyTree>, SnapshotError> {
    let path = path.as_ref();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "snapshot not found; serving placeholder taxonomy");
            return Ok(Arc::new(TaxonomyTree::placeholder(
                PLACEHOLDER_TAXONOMY_ID,
                PLACEHOLDER_TAXONOMY_NAME,
            )));
        }
        Err(source) => {
            return Err(SnapshotError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let response: TaxonomyResponse =
        serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let tree = response.into_tree();
    info!(
        path = %path.display(),
        taxonomy_id = %tree.id,
        nodes = tree.nodes.len(),
        "loaded taxonomy snapshot"
    );
    Ok(tree)
}

/// Serves one preloaded tree for every id.
#[derive(Debug, Clone)]
pub struct SnapshotBackend {
    tree: Arc<TaxonomyTree>,
}

impl SnapshotBackend {
    /// Serve `tree`.
    pub fn new(tree: Arc<TaxonomyTree>) -> Self {
        Self { tree }
    }

    /// Load the snapshot at `path` and serve it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        load_snapshot(path).map(Self::new)
    }

    /// The tree handed out on every fetch.
    pub fn tree(&self) -> &Arc<TaxonomyTree> {
        &self.tree
    }
}

#[async_trait]
impl TaxonomyBackend for SnapshotBackend {
    async fn fetch_by_id(
        &self,
        taxonomy_id: &str,
        _deadline: Instant,
    ) -> Result<Arc<TaxonomyTree>, BackendError> {
        // The requested id is logged, never matched.
        debug!(taxonomy_id, served = %self.tree.id, "GetTaxonomyById");
        Ok(Arc::clone(&self.tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const SNAPSHOT: &str = r#"{
        "taxonomyInfo": {
            "taxonomyId": "1701181887VZ",
            "name": "Curriculum",
            "createdAt": "1700000000",
            "updatedAt": 1700000100,
            "nodes": {
                "n1": { "id": "n1", "name": "Math", "nodeType": 2, "children": ["n2"] },
                "n2": { "id": "n2", "name": "Algebra", "nodeType": "TOPIC", "parentNode": "n1" }
            },
            "rootNodes": ["n1"]
        }
    }"#;

    fn write_snapshot(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_snapshot_file() {
        let file = write_snapshot(SNAPSHOT);
        let tree = load_snapshot(file.path()).unwrap();
        assert_eq!(tree.id, "1701181887VZ");
        assert_eq!(tree.created_at, 1_700_000_000);
        assert_eq!(tree.updated_at, 1_700_000_100);
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.nodes["n2"].node_type, 4);
        assert_eq!(tree.root_nodes, vec!["n1".to_string()]);
    }

    #[test]
    fn missing_file_serves_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let tree = load_snapshot(dir.path().join("taxonomy_raw.json")).unwrap();
        assert_eq!(tree.id, PLACEHOLDER_TAXONOMY_ID);
        assert_eq!(tree.name, PLACEHOLDER_TAXONOMY_NAME);
        assert!(tree.nodes.is_empty());
        assert!(tree.root_nodes.is_empty());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let file = write_snapshot("{ not json");
        let err = load_snapshot(file.path()).unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { .. }), "got {err:?}");
        assert!(err.to_string().starts_with("parsing snapshot "));
    }

    #[test]
    fn unreadable_path_is_a_read_error() {
        // a directory exists but cannot be read as a file
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(dir.path()).unwrap_err();
        assert!(matches!(err, SnapshotError::Read { .. }), "got {err:?}");
    }

    #[test]
    fn response_without_taxonomy_info_is_an_empty_tree() {
        let file = write_snapshot("{}");
        let tree = load_snapshot(file.path()).unwrap();
        assert_eq!(*tree, TaxonomyTree::default());
    }

    #[tokio::test]
    async fn every_id_gets_the_same_shared_tree() {
        let file = write_snapshot(SNAPSHOT);
        let backend = SnapshotBackend::from_path(file.path()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(1);
        let a = backend.fetch_by_id("1701181887VZ", deadline).await.unwrap();
        let b = backend.fetch_by_id("some-other-id", deadline).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, backend.tree()));
        assert_eq!(b.id, "1701181887VZ");
    }
}
