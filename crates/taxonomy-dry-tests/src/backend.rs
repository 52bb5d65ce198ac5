// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scriptable backend stub.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use taxonomy_client::{BackendError, TaxonomyBackend};
use taxonomy_model::TaxonomyTree;
use tokio::time::Instant;

/// [`TaxonomyBackend`] that returns a fixed outcome and records every id it
/// was asked for.
///
/// The stub ignores the deadline it is given; callers that promise a bound
/// must enforce it themselves. Clones share the request log.
#[derive(Clone)]
pub struct StubBackend {
    outcome: Result<Arc<TaxonomyTree>, BackendError>,
    delay: Option<Duration>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StubBackend {
    /// Answer every fetch with `tree`.
    pub fn serving(tree: TaxonomyTree) -> Self {
        Self::with_outcome(Ok(Arc::new(tree)))
    }

    /// Fail every fetch with `err`.
    pub fn failing(err: BackendError) -> Self {
        Self::with_outcome(Err(err))
    }

    fn with_outcome(outcome: Result<Arc<TaxonomyTree>, BackendError>) -> Self {
        Self {
            outcome,
            delay: None,
            requested: Arc::default(),
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn log(&self) -> MutexGuard<'_, Vec<String>> {
        self.requested
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Ids requested so far, in call order.
    pub fn requested_ids(&self) -> Vec<String> {
        self.log().clone()
    }
}

#[async_trait]
impl TaxonomyBackend for StubBackend {
    async fn fetch_by_id(
        &self,
        taxonomy_id: &str,
        _deadline: Instant,
    ) -> Result<Arc<TaxonomyTree>, BackendError> {
        self.log().push(taxonomy_id.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}
