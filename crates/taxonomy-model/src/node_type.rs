// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Closed node-type enumeration and its label table.

use std::fmt;

/// Classification level of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum NodeType {
    /// Code 0.
    Undefined = 0,
    /// Code 1.
    Class = 1,
    /// Code 2.
    Subject = 2,
    /// Code 3.
    SuperTopic = 3,
    /// Code 4.
    Topic = 4,
    /// Code 5.
    Subtopic = 5,
    /// Code 6.
    Concept = 6,
}

/// A node type code outside the closed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown node type code {0}")]
pub struct UnknownNodeTypeCode(pub i32);

impl NodeType {
    /// Every variant in code order.
    pub const ALL: [NodeType; 7] = [
        NodeType::Undefined,
        NodeType::Class,
        NodeType::Subject,
        NodeType::SuperTopic,
        NodeType::Topic,
        NodeType::Subtopic,
        NodeType::Concept,
    ];

    /// Numeric wire code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// External label (e.g. `"SUBJECT"`).
    pub fn label(self) -> &'static str {
        match self {
            NodeType::Undefined => "NODETYPE_UNDEFINED",
            NodeType::Class => "CLASS",
            NodeType::Subject => "SUBJECT",
            NodeType::SuperTopic => "SUPER_TOPIC",
            NodeType::Topic => "TOPIC",
            NodeType::Subtopic => "SUBTOPIC",
            NodeType::Concept => "CONCEPT",
        }
    }

    /// Inverse of [`NodeType::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.label() == label)
    }
}

impl TryFrom<i32> for NodeType {
    type Error = UnknownNodeTypeCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.code() == code)
            .ok_or(UnknownNodeTypeCode(code))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
