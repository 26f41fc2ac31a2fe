use thiserror::Error;

use crate::tree::ids::{NodeId, StructureKey};

/// Error type for search tree construction and traversal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// Attempted to access a node id that does not exist in the arena.
    #[error("missing node with id {node_id}")]
    MissingNode { node_id: NodeId },

    /// A node references a structure the registry does not hold.
    #[error("missing structure for key {}", key.value())]
    MissingStructure { key: StructureKey },

    /// Selection reached a node whose children are all filtered out
    /// by the depth bound or the target exclusion.
    #[error("no selectable candidates below node {node_id}")]
    NoCandidates { node_id: NodeId },

    /// No node has been expanded yet.
    #[error("search tree has no expanded nodes")]
    EmptyTree,

    /// A snapshot could not be turned back into a tree.
    #[error("inconsistent tree snapshot: {reason}")]
    InvalidSnapshot { reason: String },
}
