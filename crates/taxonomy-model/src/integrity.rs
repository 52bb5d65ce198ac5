// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Referential-integrity check for a decoded tree.
//!
//! Decoding never enforces these rules (the upstream service does not either);
//! callers run the check explicitly when they want it.

use std::fmt;

use crate::tree::TaxonomyTree;

/// One broken reference or key/id mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// Map key differs from the node's own `id`.
    KeyMismatch {
        /// Key in the node map.
        key: String,
        /// The node's `id` field.
        node_id: String,
    },
    /// `rootNodes` names a node that is not in the map.
    MissingRoot {
        /// Dangling root id.
        node_id: String,
    },
    /// A node lists a child that is not in the map.
    MissingChild {
        /// Node holding the reference.
        node_id: String,
        /// Dangling child id.
        child: String,
    },
    /// A node lists an ancestor that is not in the map.
    MissingAncestor {
        /// Node holding the reference.
        node_id: String,
        /// Dangling ancestor id.
        ancestor: String,
    },
    /// A node's `parentNode` is not in the map.
    MissingParent {
        /// Node holding the reference.
        node_id: String,
        /// Dangling parent id.
        parent: String,
    },
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyMismatch { key, node_id } => {
                write!(f, "node map key {key:?} holds node with id {node_id:?}")
            }
            Self::MissingRoot { node_id } => write!(f, "root {node_id:?} is not a known node"),
            Self::MissingChild { node_id, child } => {
                write!(f, "node {node_id:?} lists unknown child {child:?}")
            }
            Self::MissingAncestor { node_id, ancestor } => {
                write!(f, "node {node_id:?} lists unknown ancestor {ancestor:?}")
            }
            Self::MissingParent { node_id, parent } => {
                write!(f, "node {node_id:?} has unknown parent {parent:?}")
            }
        }
    }
}

/// Failed integrity check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("taxonomy {taxonomy_id:?} has {} broken reference(s)", .violations.len())]
pub struct IntegrityError {
    /// Tree that failed the check.
    pub taxonomy_id: String,
    /// Every violation found, in discovery order.
    pub violations: Vec<IntegrityViolation>,
}

impl TaxonomyTree {
    /// Collect every integrity violation: key/id mismatches first, then
    /// dangling roots, then per-node dangling references (in key order).
    pub fn integrity_violations(&self) -> Vec<IntegrityViolation> {
        let mut out = Vec::new();
        for (key, node) in &self.nodes {
            if *key != node.id {
                out.push(IntegrityViolation::KeyMismatch {
                    key: key.clone(),
                    node_id: node.id.clone(),
                });
            }
        }
        for root in &self.root_nodes {
            if !self.nodes.contains_key(root) {
                out.push(IntegrityViolation::MissingRoot {
                    node_id: root.clone(),
                });
            }
        }
        for (key, node) in &self.nodes {
            let parent = node.parent_node();
            if !parent.is_empty() && !self.nodes.contains_key(parent) {
                out.push(IntegrityViolation::MissingParent {
                    node_id: key.clone(),
                    parent: parent.to_string(),
                });
            }
            for child in node.children.iter().filter(|c| !self.nodes.contains_key(*c)) {
                out.push(IntegrityViolation::MissingChild {
                    node_id: key.clone(),
                    child: child.clone(),
                });
            }
            for ancestor in node.ancestors.iter().filter(|a| !self.nodes.contains_key(*a)) {
                out.push(IntegrityViolation::MissingAncestor {
                    node_id: key.clone(),
                    ancestor: ancestor.clone(),
                });
            }
        }
        out
    }

    /// `Ok(())` when [`TaxonomyTree::integrity_violations`] is empty.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        let violations = self.integrity_violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(IntegrityError {
                taxonomy_id: self.id.clone(),
                violations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    fn node(id: &str) -> Node {
        Node {
            id: id.into(),
            name: id.into(),
            ..Node::default()
        }
    }

    fn consistent_tree() -> TaxonomyTree {
        let mut tree = TaxonomyTree::placeholder("t1", "Curriculum");
        let mut root = node("math");
        root.children = vec!["algebra".into()];
        let mut leaf = node("algebra");
        leaf.parent_node = Some("math".into());
        leaf.ancestors = vec!["math".into()];
        tree.nodes.insert("math".into(), root);
        tree.nodes.insert("algebra".into(), leaf);
        tree.root_nodes = vec!["math".into()];
        tree
    }

    #[test]
    fn consistent_tree_passes() {
        let tree = consistent_tree();
        assert!(tree.integrity_violations().is_empty());
        assert!(tree.check_integrity().is_ok());
    }

    #[test]
    fn empty_tree_passes() {
        assert!(TaxonomyTree::placeholder("t", "T").check_integrity().is_ok());
    }

    #[test]
    fn reports_every_dangling_reference() {
        let mut tree = consistent_tree();
        tree.root_nodes.push("ghost-root".into());
        let math = tree.nodes.get_mut("math").unwrap();
        math.children.push("ghost-child".into());
        let algebra = tree.nodes.get_mut("algebra").unwrap();
        algebra.ancestors.insert(0, "ghost-ancestor".into());
        algebra.parent_node = Some("ghost-parent".into());

        let violations = tree.integrity_violations();
        assert_eq!(
            violations,
            vec![
                IntegrityViolation::MissingRoot {
                    node_id: "ghost-root".into()
                },
                IntegrityViolation::MissingParent {
                    node_id: "algebra".into(),
                    parent: "ghost-parent".into()
                },
                IntegrityViolation::MissingAncestor {
                    node_id: "algebra".into(),
                    ancestor: "ghost-ancestor".into()
                },
                IntegrityViolation::MissingChild {
                    node_id: "math".into(),
                    child: "ghost-child".into()
                },
            ]
        );
        let err = tree.check_integrity().unwrap_err();
        assert_eq!(err.taxonomy_id, "t1");
        assert_eq!(err.violations.len(), 4);
        assert!(err.to_string().contains("4 broken reference(s)"));
    }

    #[test]
    fn reports_key_id_mismatch() {
        let mut tree = consistent_tree();
        tree.nodes.insert("geometry".into(), node("geo"));
        assert_eq!(
            tree.integrity_violations(),
            vec![IntegrityViolation::KeyMismatch {
                key: "geometry".into(),
                node_id: "geo".into()
            }]
        );
    }

    #[test]
    fn empty_parent_is_treated_as_unset() {
        let mut tree = consistent_tree();
        tree.nodes.get_mut("math").unwrap().parent_node = Some(String::new());
        assert!(tree.check_integrity().is_ok());
    }
}
