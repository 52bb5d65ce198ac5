// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical taxonomy tree shared by the gateway, the backend client and the
//! mock service.
//!
//! The tree is pure data: a root descriptor plus a flat `id -> Node` map.
//! [`transform`] renders it into the external JSON shape (node type labels,
//! stringified timestamps, empty optionals omitted). Nothing in this crate
//! performs I/O.
#![forbid(unsafe_code)]

pub mod integrity;
pub mod node_type;
pub mod transform;
mod tree;

pub use integrity::{IntegrityError, IntegrityViolation};
pub use node_type::{NodeType, UnknownNodeTypeCode};
pub use transform::{
    transform, transform_response, ExternalNode, ExternalRelatedNode, ExternalResponse,
    ExternalTree, TransformError,
};
pub use tree::{Node, NodeId, RelatedNode, TaxonomyId, TaxonomyResponse, TaxonomyTree};
