// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTTP front door for taxonomy lookups.
//!
//! `GET /api/taxonomy/{id}` fetches one taxonomy from a [`TaxonomyBackend`]
//! and renders it as JSON; `GET /api/taxonomy` does the same for the
//! configured default id. `?format=transformed` selects the external shape
//! (node type labels, string timestamps); anything else returns the canonical
//! tree under `taxonomyInfo`.
//!
//! [`TaxonomyBackend`]: taxonomy_client::TaxonomyBackend
#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod routes;

pub use cli::Args;
pub use error::GatewayError;
pub use routes::{router, AppState, OutputFormat, TaxonomyQuery};
pub use taxonomy_app_core::prefs::DEFAULT_TAXONOMY_ID;

/// Default upper bound on one backend call.
pub const FETCH_DEADLINE: std::time::Duration =
    std::time::Duration::from_millis(taxonomy_app_core::prefs::DEFAULT_FETCH_TIMEOUT_MS);
