use serde::{Deserialize, Serialize};

/// A wrapper for an integer index used to address nodes in the search tree.
/// The root always sits at index 0, every other node is numbered in insertion order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the raw index without exposing the inner field.
    pub fn index(&self) -> usize {
        self.0
    }

    /// Whether this id addresses the root sentinel.
    pub fn is_root(&self) -> bool {
        self.0 == 0
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        NodeId(value)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str("root")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Lightweight handle into the structure registry.
/// Nodes carry this key instead of a copy of the molecule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureKey(u64);

impl StructureKey {
    /// Return the internal numeric representation of this key.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for StructureKey {
    fn from(value: u64) -> Self {
        StructureKey(value)
    }
}

impl From<NodeId> for StructureKey {
    /// Structures are registered under the id of the node that introduced them.
    fn from(value: NodeId) -> Self {
        StructureKey(value.index() as u64)
    }
}
