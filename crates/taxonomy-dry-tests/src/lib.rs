// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for the taxonomy crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`backend`] - Scriptable [`TaxonomyBackend`](taxonomy_client::TaxonomyBackend) stub
//! - [`trees`] - Tree and node builders

pub mod backend;
pub mod config;
pub mod trees;

pub use backend::StubBackend;
pub use config::InMemoryConfigStore;
pub use trees::{NodeBuilder, TreeBuilder};
