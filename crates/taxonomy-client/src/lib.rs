// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backend side of the taxonomy gateway.
//!
//! [`TaxonomyBackend`] is the one contract the gateway depends on: fetch a
//! taxonomy by id before a deadline. Two implementations ship here:
//!
//! - [`RemoteBackend`] calls the taxonomy service over TCP (one multiplexed
//!   connection shared by all requests);
//! - [`SnapshotBackend`] serves a tree loaded once from a JSON snapshot. It
//!   answers every id with the same tree, which the real service never does.

pub mod backend;
pub mod remote;
pub mod snapshot;

pub use backend::{BackendError, TaxonomyBackend};
pub use remote::RemoteBackend;
pub use snapshot::{
    load_snapshot, SnapshotBackend, SnapshotError, PLACEHOLDER_TAXONOMY_ID,
    PLACEHOLDER_TAXONOMY_NAME,
};
