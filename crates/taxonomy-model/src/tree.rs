// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tree model: taxonomy metadata, the node map and per-node relations.
//!
//! Field names follow the wire form (`taxonomyId`, `rootNodes`, ...); the
//! snake_case spellings are accepted on decode so snapshots dumped by other
//! tools load unchanged. Absent fields decode to their zero value.

use serde::de::{Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::node_type::{NodeType, UnknownNodeTypeCode};

/// Opaque taxonomy identifier.
pub type TaxonomyId = String;
/// Node identifier, unique within one taxonomy.
pub type NodeId = String;

/// One taxonomy: descriptive metadata plus a flat map of its nodes.
///
/// Trees are built once per fetch (or once per snapshot load) and shared
/// behind [`Arc`]; nothing mutates a tree after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxonomyTree {
    /// Stable primary key.
    #[serde(rename = "taxonomyId", alias = "taxonomy_id")]
    pub id: TaxonomyId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Version label.
    pub version: String,
    /// Owning tenant.
    #[serde(alias = "tenant_id")]
    pub tenant_id: String,
    /// Creation instant (epoch-like integer).
    #[serde(alias = "created_at", deserialize_with = "int_or_decimal_string")]
    pub created_at: i64,
    /// Last update instant (epoch-like integer).
    #[serde(alias = "updated_at", deserialize_with = "int_or_decimal_string")]
    pub updated_at: i64,
    /// Node id -> node. The key duplicates [`Node::id`].
    pub nodes: BTreeMap<NodeId, Node>,
    /// Root node ids in display order.
    #[serde(alias = "root_nodes")]
    pub root_nodes: Vec<NodeId>,
    /// Level labels describing depth semantics (informational).
    pub levels: Vec<String>,
}

impl TaxonomyTree {
    /// Empty-but-valid tree: identifying metadata set, no nodes.
    pub fn placeholder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A single classification entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    /// Node id (equals its key in [`TaxonomyTree::nodes`]).
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Optional description; `None` is "not set", distinct from `""`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional short code.
    #[serde(alias = "short_code", skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
    /// Optional parent node id.
    #[serde(alias = "parent_node", skip_serializing_if = "Option::is_none")]
    pub parent_node: Option<NodeId>,
    /// Raw node type code; see [`Node::node_type`] for the typed view.
    #[serde(alias = "node_type", deserialize_with = "node_type_code")]
    pub node_type: i32,
    /// Cross-taxonomy references, in source order.
    #[serde(alias = "related_nodes", skip_serializing_if = "Vec::is_empty")]
    pub related_nodes: Vec<RelatedNode>,
    /// Child node ids, in source order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    /// Ancestor node ids, root first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<NodeId>,
    /// Inactive flag.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inactive: bool,
}

impl Node {
    /// Description, or `""` when unset.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Short code, or `""` when unset.
    pub fn short_code(&self) -> &str {
        self.short_code.as_deref().unwrap_or_default()
    }

    /// Parent node id, or `""` when unset.
    pub fn parent_node(&self) -> &str {
        self.parent_node.as_deref().unwrap_or_default()
    }

    /// Typed node type; fails for codes outside the closed enumeration.
    pub fn node_type(&self) -> Result<NodeType, UnknownNodeTypeCode> {
        NodeType::try_from(self.node_type)
    }
}

/// Weak reference to a node in another (or the same) taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelatedNode {
    /// Foreign taxonomy id.
    #[serde(alias = "taxonomy_id")]
    pub taxonomy_id: TaxonomyId,
    /// Node id within that taxonomy.
    #[serde(alias = "node_id")]
    pub node_id: NodeId,
}

/// Response body of `GetTaxonomyById`; also the on-disk snapshot shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxonomyResponse {
    /// The fetched tree; absent reads as an empty tree.
    #[serde(alias = "taxonomy_info")]
    pub taxonomy_info: Option<Arc<TaxonomyTree>>,
}

impl TaxonomyResponse {
    /// Wrap a shared tree.
    pub fn new(tree: Arc<TaxonomyTree>) -> Self {
        Self {
            taxonomy_info: Some(tree),
        }
    }

    /// Shared handle to the carried tree, or an empty tree.
    pub fn taxonomy_info(&self) -> Arc<TaxonomyTree> {
        self.taxonomy_info.clone().unwrap_or_default()
    }

    /// The carried tree, or an empty one when the response has none.
    pub fn into_tree(self) -> Arc<TaxonomyTree> {
        self.taxonomy_info.unwrap_or_default()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrText {
    Int(i64),
    Text(String),
}

// JSON dumps of int64 fields sometimes quote them.
fn int_or_decimal_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match IntOrText::deserialize(deserializer)? {
        IntOrText::Int(n) => Ok(n),
        IntOrText::Text(s) if s.is_empty() => Ok(0),
        IntOrText::Text(s) => s.parse().map_err(D::Error::custom),
    }
}

// Accepts the numeric code or a label such as "SUBJECT". Unknown numeric
// codes are kept as-is; rejecting them is the transformer's job.
fn node_type_code<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    match IntOrText::deserialize(deserializer)? {
        IntOrText::Int(n) => i32::try_from(n).map_err(D::Error::custom),
        IntOrText::Text(label) => NodeType::from_label(&label)
            .map(NodeType::code)
            .ok_or_else(|| D::Error::custom(format!("unknown node type label {label:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_without_tree_reads_as_empty() {
        let resp: TaxonomyResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(*resp.taxonomy_info(), TaxonomyTree::default());
        assert!(resp.into_tree().nodes.is_empty());
    }

    #[test]
    fn absent_fields_read_as_zero_values() {
        let node: Node = serde_json::from_value(json!({ "id": "n1", "name": "Algebra" })).unwrap();
        assert_eq!(node.description(), "");
        assert_eq!(node.short_code(), "");
        assert_eq!(node.parent_node(), "");
        assert_eq!(node.node_type, 0);
        assert!(node.related_nodes.is_empty());
        assert!(node.children.is_empty());
        assert!(node.ancestors.is_empty());
        assert!(!node.inactive);
    }

    #[test]
    fn empty_string_is_distinct_from_unset() {
        let node: Node =
            serde_json::from_value(json!({ "id": "n1", "name": "x", "description": "" })).unwrap();
        assert_eq!(node.description, Some(String::new()));
        assert_eq!(node.short_code, None);
    }

    #[test]
    fn decodes_snake_case_and_quoted_timestamps() {
        let tree: TaxonomyTree = serde_json::from_value(json!({
            "taxonomy_id": "t1",
            "tenant_id": "acme",
            "created_at": "1701181887",
            "updatedAt": 1701181999,
            "root_nodes": ["a"],
            "nodes": { "a": { "id": "a", "name": "A", "node_type": "TOPIC", "short_code": "A1" } }
        }))
        .unwrap();
        assert_eq!(tree.id, "t1");
        assert_eq!(tree.tenant_id, "acme");
        assert_eq!(tree.created_at, 1_701_181_887);
        assert_eq!(tree.updated_at, 1_701_181_999);
        assert_eq!(tree.root_nodes, vec!["a".to_string()]);
        let a = &tree.nodes["a"];
        assert_eq!(a.node_type, 4);
        assert_eq!(a.short_code(), "A1");
    }

    #[test]
    fn unknown_numeric_node_type_survives_decode() {
        let node: Node =
            serde_json::from_value(json!({ "id": "n", "name": "n", "nodeType": 42 })).unwrap();
        assert_eq!(node.node_type, 42);
        assert!(node.node_type().is_err());
    }

    #[test]
    fn unknown_node_type_label_is_rejected() {
        let err = serde_json::from_value::<Node>(json!({ "id": "n", "nodeType": "GENUS" }))
            .unwrap_err();
        assert!(err.to_string().contains("GENUS"));
    }

    #[test]
    fn canonical_encoding_omits_unset_node_fields() {
        let node = Node {
            id: "n1".into(),
            name: "Physics".into(),
            node_type: 2,
            ..Node::default()
        };
        let v = serde_json::to_value(&node).unwrap();
        assert_eq!(v, json!({ "id": "n1", "name": "Physics", "nodeType": 2 }));
    }
}
