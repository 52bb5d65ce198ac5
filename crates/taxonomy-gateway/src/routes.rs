// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Router, shared state and the taxonomy handler.

use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use taxonomy_client::{
    BackendError, RemoteBackend, SnapshotBackend, SnapshotError, TaxonomyBackend,
};
use taxonomy_model::{transform_response, TaxonomyResponse, TaxonomyTree};
use tokio::time::{self, Instant};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::{DEFAULT_TAXONOMY_ID, FETCH_DEADLINE};

/// Per-process state shared by every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Where taxonomies come from.
    pub backend: Arc<dyn TaxonomyBackend>,
    /// Backend description for logs (address or snapshot path).
    pub target: String,
    /// Id used by `GET /api/taxonomy`.
    pub default_taxonomy_id: String,
    /// Upper bound on one backend call.
    pub fetch_timeout: Duration,
}

impl AppState {
    /// State with the default id and deadline.
    pub fn new(backend: Arc<dyn TaxonomyBackend>, target: impl Into<String>) -> Self {
        Self {
            backend,
            target: target.into(),
            default_taxonomy_id: DEFAULT_TAXONOMY_ID.to_string(),
            fetch_timeout: FETCH_DEADLINE,
        }
    }

    /// State calling the taxonomy service at `addr`.
    pub fn remote(addr: impl Into<String>) -> Self {
        let backend = RemoteBackend::new(addr);
        let target = backend.addr().to_string();
        Self::new(Arc::new(backend), target)
    }

    /// State serving one snapshot file in-process. Integrity violations are
    /// logged, never fatal.
    pub fn from_snapshot(path: &std::path::Path) -> Result<Self, SnapshotError> {
        let snapshot = SnapshotBackend::from_path(path)?;
        for violation in snapshot.tree().integrity_violations() {
            warn!(%violation, "snapshot integrity");
        }
        Ok(Self::new(Arc::new(snapshot), format!("snapshot:{}", path.display())))
    }

    /// Replace the default id.
    pub fn with_default_taxonomy_id(mut self, id: impl Into<String>) -> Self {
        self.default_taxonomy_id = id.into();
        self
    }

    /// Replace the per-call deadline.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// Query string of the taxonomy routes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TaxonomyQuery {
    /// `transformed` selects the external shape; anything else is canonical.
    pub format: Option<String>,
}

impl TaxonomyQuery {
    /// Pick the known keys out of decoded query pairs. A repeated key keeps
    /// its first value; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let format = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "format").then_some(value));
        Self { format }
    }
}

/// Response body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `{"taxonomyInfo": <tree>}` as the backend returned it.
    Canonical,
    /// Node type labels and string timestamps.
    Transformed,
}

impl OutputFormat {
    /// Only an exact `transformed` selects [`OutputFormat::Transformed`].
    pub fn from_query(format: Option<&str>) -> Self {
        match format {
            Some("transformed") => Self::Transformed,
            _ => Self::Canonical,
        }
    }
}

/// Build the gateway router with HTTP tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/taxonomy", get(get_default_taxonomy))
        .route("/api/taxonomy/{id}", get(get_taxonomy))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_default_taxonomy(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, GatewayError> {
    let id = state.default_taxonomy_id.clone();
    respond(&state, &id, &TaxonomyQuery::from_pairs(pairs)).await
}

async fn get_taxonomy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, GatewayError> {
    respond(&state, &id, &TaxonomyQuery::from_pairs(pairs)).await
}

async fn respond(
    state: &AppState,
    taxonomy_id: &str,
    query: &TaxonomyQuery,
) -> Result<Response, GatewayError> {
    let tree = fetch(state, taxonomy_id).await?;
    let format = OutputFormat::from_query(query.format.as_deref());
    let body = render(&tree, format)?;
    Ok(([(CONTENT_TYPE, "application/json")], body).into_response())
}

// The bound holds even for backends that ignore `deadline`.
async fn fetch(state: &AppState, taxonomy_id: &str) -> Result<Arc<TaxonomyTree>, BackendError> {
    let started = Instant::now();
    let deadline = started + state.fetch_timeout;
    info!(
        method = "GetTaxonomyById",
        target = %state.target,
        taxonomy_id,
        "dispatching backend request"
    );
    let call = state.backend.fetch_by_id(taxonomy_id, deadline);
    let result = time::timeout_at(deadline, call)
        .await
        .unwrap_or_else(|_| {
            Err(BackendError::DeadlineExceeded {
                taxonomy_id: taxonomy_id.to_string(),
                waited: started.elapsed(),
            })
        });
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match &result {
        Ok(tree) => info!(
            taxonomy_id,
            elapsed_ms,
            nodes = tree.nodes.len(),
            "backend request completed"
        ),
        Err(err) => info!(taxonomy_id, elapsed_ms, kind = err.kind(), "backend request failed"),
    }
    result
}

/// Encode `tree` in the requested shape. The whole body is produced before
/// any byte is written.
pub fn render(tree: &Arc<TaxonomyTree>, format: OutputFormat) -> Result<Vec<u8>, GatewayError> {
    let body = match format {
        OutputFormat::Canonical => serde_json::to_vec(&TaxonomyResponse::new(Arc::clone(tree)))?,
        OutputFormat::Transformed => serde_json::to_vec(&transform_response(tree)?)?,
    };
    debug!(bytes = body.len(), ?format, "rendered taxonomy");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use taxonomy_dry_tests::{NodeBuilder, TreeBuilder};
    use taxonomy_model::NodeType;

    #[test]
    fn only_exact_transformed_selects_the_external_shape() {
        assert_eq!(OutputFormat::from_query(Some("transformed")), OutputFormat::Transformed);
        for other in [None, Some(""), Some("raw"), Some("Transformed"), Some("transformed ")] {
            assert_eq!(OutputFormat::from_query(other), OutputFormat::Canonical, "{other:?}");
        }
    }

    #[test]
    fn repeated_format_key_keeps_the_first_value() {
        let pairs = |kv: &[(&str, &str)]| {
            kv.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<Vec<_>>()
        };
        let query =
            TaxonomyQuery::from_pairs(pairs(&[("format", "transformed"), ("format", "raw")]));
        assert_eq!(query.format.as_deref(), Some("transformed"));
        let query = TaxonomyQuery::from_pairs(pairs(&[("x", "1"), ("format", "raw")]));
        assert_eq!(query.format.as_deref(), Some("raw"));
        assert_eq!(TaxonomyQuery::from_pairs(Vec::new()), TaxonomyQuery::default());
    }

    #[test]
    fn canonical_render_wraps_the_tree() {
        let tree = Arc::new(
            TreeBuilder::new("t")
                .timestamps(1, 2)
                .root(NodeBuilder::new("n1", "Math").node_type(NodeType::Subject))
                .build(),
        );
        let body: Value =
            serde_json::from_slice(&render(&tree, OutputFormat::Canonical).unwrap()).unwrap();
        assert_eq!(body["taxonomyInfo"]["taxonomyId"], "t");
        assert_eq!(body["taxonomyInfo"]["createdAt"], 1);
        assert_eq!(body["taxonomyInfo"]["nodes"]["n1"]["nodeType"], 2);
    }

    #[test]
    fn transformed_render_labels_node_types() {
        let tree = Arc::new(
            TreeBuilder::new("t")
                .timestamps(1, 2)
                .root(NodeBuilder::new("n1", "Math").node_type(NodeType::Subject))
                .build(),
        );
        let body: Value =
            serde_json::from_slice(&render(&tree, OutputFormat::Transformed).unwrap()).unwrap();
        assert_eq!(body["taxonomyInfo"]["createdAt"], "1");
        assert_eq!(body["taxonomyInfo"]["nodes"]["n1"]["nodeType"], "SUBJECT");
    }

    #[test]
    fn unknown_node_type_fails_render() {
        let tree = Arc::new(
            TreeBuilder::new("t")
                .root(NodeBuilder::new("bad", "Bad").raw_node_type(42))
                .build(),
        );
        let err = render(&tree, OutputFormat::Transformed).unwrap_err();
        assert!(matches!(err, GatewayError::Transform(_)));
        // the canonical shape carries the raw code through
        assert!(render(&tree, OutputFormat::Canonical).is_ok());
    }
}
