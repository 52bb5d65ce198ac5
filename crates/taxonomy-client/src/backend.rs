// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The fetch-by-id contract shared by the real and mock backends.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use taxonomy_model::TaxonomyTree;
use tokio::time::Instant;

/// Resolves a taxonomy id to a tree.
///
/// The backend fetches exactly the id it is given; substituting a default id
/// is the caller's job. Implementations must give up promptly once `deadline`
/// passes and must never hand out a tree that callers could mutate.
#[async_trait]
pub trait TaxonomyBackend: Send + Sync {
    /// Fetch one taxonomy, or fail with a typed error.
    async fn fetch_by_id(
        &self,
        taxonomy_id: &str,
        deadline: Instant,
    ) -> Result<Arc<TaxonomyTree>, BackendError>;
}

/// Failure of a `GetTaxonomyById` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The service could not be reached or the connection broke.
    #[error("GetTaxonomyById({taxonomy_id}): taxonomy service at {addr} unavailable: {reason}")]
    Unavailable {
        /// Requested id.
        taxonomy_id: String,
        /// Service address.
        addr: String,
        /// Transport-level cause.
        reason: String,
    },
    /// No answer before the deadline.
    #[error("GetTaxonomyById({taxonomy_id}): deadline exceeded after {}ms", .waited.as_millis())]
    DeadlineExceeded {
        /// Requested id.
        taxonomy_id: String,
        /// Time spent before giving up.
        waited: Duration,
    },
    /// The service answered with an error payload.
    #[error("GetTaxonomyById({taxonomy_id}): service returned {name} ({code}): {message}")]
    Remote {
        /// Requested id.
        taxonomy_id: String,
        /// Error code from the service.
        code: u32,
        /// Stable error name from the service.
        name: String,
        /// Message from the service.
        message: String,
    },
    /// The reply could not be understood.
    #[error("GetTaxonomyById({taxonomy_id}): protocol error: {reason}")]
    Protocol {
        /// Requested id.
        taxonomy_id: String,
        /// What was wrong with the reply.
        reason: String,
    },
}

impl BackendError {
    /// Stable label for logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::Remote { .. } => "remote",
            Self::Protocol { .. } => "protocol",
        }
    }

    /// The id the failed call asked for.
    pub fn taxonomy_id(&self) -> &str {
        match self {
            Self::Unavailable { taxonomy_id, .. }
            | Self::DeadlineExceeded { taxonomy_id, .. }
            | Self::Remote { taxonomy_id, .. }
            | Self::Protocol { taxonomy_id, .. } => taxonomy_id,
        }
    }

    /// True for [`BackendError::DeadlineExceeded`].
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}
