// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Builders for [`TaxonomyTree`] and [`Node`] fixtures.

use taxonomy_model::{Node, NodeType, RelatedNode, TaxonomyTree};

/// Builder for [`TaxonomyTree`] fixtures.
///
/// Nodes are keyed by their own id; [`TreeBuilder::root`] also appends the id
/// to `rootNodes`.
///
/// # Example
///
/// ```
/// use taxonomy_dry_tests::{NodeBuilder, TreeBuilder};
/// use taxonomy_model::NodeType;
///
/// let tree = TreeBuilder::new("1701181887VZ")
///     .name("Curriculum")
///     .root(NodeBuilder::new("n1", "Math").node_type(NodeType::Subject))
///     .build();
///
/// assert_eq!(tree.root_nodes, vec!["n1".to_string()]);
/// assert_eq!(tree.nodes["n1"].node_type, 2);
/// ```
pub struct TreeBuilder {
    tree: TaxonomyTree,
}

impl TreeBuilder {
    /// Empty tree with the given id.
    pub fn new(id: &str) -> Self {
        Self {
            tree: TaxonomyTree {
                id: id.to_string(),
                ..TaxonomyTree::default()
            },
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: &str) -> Self {
        self.tree.name = name.to_string();
        self
    }

    /// Set description, version and tenant.
    pub fn metadata(mut self, description: &str, version: &str, tenant_id: &str) -> Self {
        self.tree.description = description.to_string();
        self.tree.version = version.to_string();
        self.tree.tenant_id = tenant_id.to_string();
        self
    }

    /// Set creation and update instants.
    pub fn timestamps(mut self, created_at: i64, updated_at: i64) -> Self {
        self.tree.created_at = created_at;
        self.tree.updated_at = updated_at;
        self
    }

    /// Append a level label.
    pub fn level(mut self, label: &str) -> Self {
        self.tree.levels.push(label.to_string());
        self
    }

    /// Insert a node and list it as a root.
    pub fn root(mut self, node: NodeBuilder) -> Self {
        self.tree.root_nodes.push(node.node.id.clone());
        self.node(node)
    }

    /// Insert a non-root node.
    pub fn node(mut self, node: NodeBuilder) -> Self {
        let node = node.build();
        self.tree.nodes.insert(node.id.clone(), node);
        self
    }

    /// Finish.
    pub fn build(self) -> TaxonomyTree {
        self.tree
    }
}

/// Builder for [`Node`] fixtures. Defaults to an `UNDEFINED` node with no
/// optional fields.
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    /// Node with the given id and name.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            node: Node {
                id: id.to_string(),
                name: name.to_string(),
                ..Node::default()
            },
        }
    }

    /// Set a known node type.
    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.node.node_type = node_type.code();
        self
    }

    /// Set a raw code, including ones outside the enumeration.
    pub fn raw_node_type(mut self, code: i32) -> Self {
        self.node.node_type = code;
        self
    }

    /// Set the description.
    pub fn description(mut self, text: &str) -> Self {
        self.node.description = Some(text.to_string());
        self
    }

    /// Set the short code.
    pub fn short_code(mut self, code: &str) -> Self {
        self.node.short_code = Some(code.to_string());
        self
    }

    /// Set the parent id.
    pub fn parent(mut self, id: &str) -> Self {
        self.node.parent_node = Some(id.to_string());
        self
    }

    /// Append child ids.
    pub fn children(mut self, ids: &[&str]) -> Self {
        self.node.children.extend(ids.iter().map(ToString::to_string));
        self
    }

    /// Append ancestor ids, root first.
    pub fn ancestors(mut self, ids: &[&str]) -> Self {
        self.node.ancestors.extend(ids.iter().map(ToString::to_string));
        self
    }

    /// Append a cross-taxonomy reference.
    pub fn related(mut self, taxonomy_id: &str, node_id: &str) -> Self {
        self.node.related_nodes.push(RelatedNode {
            taxonomy_id: taxonomy_id.to_string(),
            node_id: node_id.to_string(),
        });
        self
    }

    /// Mark inactive.
    pub fn inactive(mut self) -> Self {
        self.node.inactive = true;
        self
    }

    /// Finish.
    pub fn build(self) -> Node {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_tree_is_internally_consistent() {
        let tree = TreeBuilder::new("t")
            .root(NodeBuilder::new("math", "Math").children(&["algebra"]))
            .node(
                NodeBuilder::new("algebra", "Algebra")
                    .parent("math")
                    .ancestors(&["math"])
                    .node_type(NodeType::Topic),
            )
            .build();
        assert!(tree.check_integrity().is_ok());
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.root_nodes, vec!["math".to_string()]);
    }

    #[test]
    fn node_defaults_leave_optionals_unset() {
        let node = NodeBuilder::new("n", "N").build();
        assert_eq!(node.description, None);
        assert_eq!(node.short_code, None);
        assert_eq!(node.parent_node, None);
        assert_eq!(node.node_type, 0);
        assert!(!node.inactive);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, serde_json::json!({"id": "n", "name": "N", "nodeType": 0}));
    }
}
