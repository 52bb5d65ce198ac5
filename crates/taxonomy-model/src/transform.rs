// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical tree -> external ("transformed") JSON shape.
//!
//! The external shape differs from the canonical one in three ways:
//!
//! * `createdAt` / `updatedAt` are decimal strings, not numbers;
//! * `nodeType` is a label (`"SUBJECT"`), not a code;
//! * empty optional node fields are omitted entirely, never emitted as `""`,
//!   `[]` or `false`.
//!
//! The external values borrow from the source tree, so a shared snapshot can
//! be transformed by many requests at once without copying or locking.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::node_type::{NodeType, UnknownNodeTypeCode};
use crate::tree::{Node, RelatedNode, TaxonomyTree};

/// Transformation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// A node carries a type code outside the closed enumeration.
    #[error("node {node_id:?} has unknown node type code {code}")]
    UnknownNodeType {
        /// Offending node (map key).
        node_id: String,
        /// Raw code found.
        code: i32,
    },
}

/// `{"taxonomyInfo": ...}` envelope of the external shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalResponse<'a> {
    /// The transformed tree.
    pub taxonomy_info: ExternalTree<'a>,
}

/// Externally rendered taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTree<'a> {
    /// Copied from [`TaxonomyTree::id`].
    pub taxonomy_id: &'a str,
    /// Copied verbatim.
    pub name: &'a str,
    /// Copied verbatim.
    pub description: &'a str,
    /// Copied verbatim.
    pub version: &'a str,
    /// Copied verbatim.
    pub tenant_id: &'a str,
    /// Decimal rendering of [`TaxonomyTree::created_at`].
    pub created_at: String,
    /// Decimal rendering of [`TaxonomyTree::updated_at`].
    pub updated_at: String,
    /// Transformed nodes keyed like the source map.
    pub nodes: BTreeMap<&'a str, ExternalNode<'a>>,
    /// Root ids, source order.
    pub root_nodes: &'a [String],
    /// Level labels, source order.
    pub levels: &'a [String],
}

/// Externally rendered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalNode<'a> {
    /// Node id.
    pub id: &'a str,
    /// Node name.
    pub name: &'a str,
    /// Present only when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    /// Present only when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_code: Option<&'a str>,
    /// Present only when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_node: Option<&'a str>,
    /// Node type label.
    pub node_type: &'static str,
    /// Present only when non-empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_nodes: Vec<ExternalRelatedNode<'a>>,
    /// Present only when non-empty.
    #[serde(skip_serializing_if = "is_empty_slice")]
    pub children: &'a [String],
    /// Present only when non-empty.
    #[serde(skip_serializing_if = "is_empty_slice")]
    pub ancestors: &'a [String],
    /// Present only when true.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inactive: bool,
}

/// Externally rendered cross-taxonomy reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRelatedNode<'a> {
    /// Foreign taxonomy id.
    pub taxonomy_id: &'a str,
    /// Node id within that taxonomy.
    pub node_id: &'a str,
}

fn is_empty_slice<T>(items: &&[T]) -> bool {
    items.is_empty()
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Transform a canonical tree into its external shape.
///
/// Fails on the first node (in key order) whose type code is unknown; no
/// placeholder label is ever substituted.
pub fn transform(tree: &TaxonomyTree) -> Result<ExternalTree<'_>, TransformError> {
    let nodes = tree
        .nodes
        .iter()
        .map(|(key, node)| Ok((key.as_str(), transform_node(key, node)?)))
        .collect::<Result<BTreeMap<_, _>, TransformError>>()?;

    Ok(ExternalTree {
        taxonomy_id: &tree.id,
        name: &tree.name,
        description: &tree.description,
        version: &tree.version,
        tenant_id: &tree.tenant_id,
        created_at: tree.created_at.to_string(),
        updated_at: tree.updated_at.to_string(),
        nodes,
        root_nodes: &tree.root_nodes,
        levels: &tree.levels,
    })
}

/// [`transform`] wrapped in the `taxonomyInfo` envelope.
pub fn transform_response(tree: &TaxonomyTree) -> Result<ExternalResponse<'_>, TransformError> {
    Ok(ExternalResponse {
        taxonomy_info: transform(tree)?,
    })
}

fn transform_node<'a>(key: &str, node: &'a Node) -> Result<ExternalNode<'a>, TransformError> {
    let node_type = NodeType::try_from(node.node_type).map_err(|UnknownNodeTypeCode(code)| {
        TransformError::UnknownNodeType {
            node_id: key.to_string(),
            code,
        }
    })?;

    Ok(ExternalNode {
        id: &node.id,
        name: &node.name,
        description: non_empty(node.description.as_ref()),
        short_code: non_empty(node.short_code.as_ref()),
        parent_node: non_empty(node.parent_node.as_ref()),
        node_type: node_type.label(),
        related_nodes: node.related_nodes.iter().map(transform_related).collect(),
        children: &node.children,
        ancestors: &node.ancestors,
        inactive: node.inactive,
    })
}

fn transform_related(related: &RelatedNode) -> ExternalRelatedNode<'_> {
    ExternalRelatedNode {
        taxonomy_id: &related.taxonomy_id,
        node_id: &related.node_id,
    }
}
