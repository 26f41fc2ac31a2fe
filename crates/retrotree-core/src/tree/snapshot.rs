use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    structures::{RegistrySnapshot, StructureRegistry},
    tree::{
        arena::Arena,
        edges::{EdgeKind, ReactionEdge},
        error::TreeError,
        evidence::EvidenceSet,
        ids::{NodeId, StructureKey},
        node::NodeRecord,
        search_tree::{SearchTree, TreeParams},
    },
};

pub const TREE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSnapshot<M, R, T> {
    pub schema_version: u32,
    pub target_signature: String,
    pub iteration: u64,
    pub rng_seed: u64,
    /// Selection RNG word position, split into high and low halves.
    pub rng_word_pos: (u64, u64),
    pub nodes: Vec<NodeSnapshot<R, T>>,
    /// Node ids written off by selection.
    #[serde(default)]
    pub blocked: Vec<usize>,
    pub structures: RegistrySnapshot<M>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot<R, T> {
    pub node_id: usize,
    pub structure_key: Option<u64>,
    pub value: f64,
    pub mean_value: f64,
    pub score: f64,
    pub visits: u64,
    pub depth: u64,
    pub parent_node_id: Option<usize>,
    pub edges: Vec<EdgeSnapshot<R, T>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSnapshot<R, T> {
    pub child_node_id: usize,
    pub cross_link: bool,
    pub reactions: Vec<R>,
    pub templates: Vec<T>,
}

impl<M, R, T> SearchTree<M, R, T>
where
    M: Clone,
    R: Clone + PartialEq,
    T: Clone + PartialEq,
{
    /// Capture the whole tree, registry included.
    pub fn snapshot(&self) -> TreeSnapshot<M, R, T> {
        let nodes = self
            .nodes()
            .map(|(node_id, node)| NodeSnapshot {
                node_id: node_id.index(),
                structure_key: node.structure().map(|key| key.value()),
                value: node.value(),
                mean_value: node.mean_value(),
                score: node.score(),
                visits: node.visits(),
                depth: node.depth(),
                parent_node_id: node.parent().map(|parent| parent.index()),
                edges: node
                    .edges()
                    .iter()
                    .map(|edge| EdgeSnapshot {
                        child_node_id: edge.child().index(),
                        cross_link: edge.kind() == EdgeKind::CrossLink,
                        reactions: edge.reactions().iter().cloned().collect(),
                        templates: edge.templates().iter().cloned().collect(),
                    })
                    .collect(),
            })
            .collect();

        let word_pos = self.rng_word_pos();
        TreeSnapshot {
            schema_version: TREE_SCHEMA_VERSION,
            target_signature: self.target_signature().to_string(),
            iteration: self.iteration(),
            rng_seed: self.params().seed,
            rng_word_pos: ((word_pos >> 64) as u64, word_pos as u64),
            nodes,
            blocked: self.blocked_nodes().map(|node_id| node_id.index()).collect(),
            structures: self.structures().snapshot(),
        }
    }

    /// Rebuild a live tree. Node ids must be dense and start with the root.
    pub fn from_snapshot(
        snapshot: TreeSnapshot<M, R, T>,
        params: TreeParams,
    ) -> Result<Self, TreeError> {
        if snapshot.schema_version != TREE_SCHEMA_VERSION {
            return Err(invalid(format!(
                "unsupported schema version {}",
                snapshot.schema_version
            )));
        }
        let node_count = snapshot.nodes.len();
        let mut records = Vec::with_capacity(node_count);

        for (idx, node) in snapshot.nodes.into_iter().enumerate() {
            if node.node_id != idx {
                return Err(invalid(format!(
                    "node id {} stored at position {idx}",
                    node.node_id
                )));
            }
            if idx == 0 && node.structure_key.is_some() {
                return Err(invalid("root carries a structure".to_string()));
            }
            let check = |id: usize| {
                if id < node_count {
                    Ok(NodeId::from(id))
                } else {
                    Err(invalid(format!("node {idx} references unknown node {id}")))
                }
            };
            let parent = node.parent_node_id.map(check).transpose()?;
            let mut edges = Vec::with_capacity(node.edges.len());
            for edge in node.edges {
                let kind = if edge.cross_link {
                    EdgeKind::CrossLink
                } else {
                    EdgeKind::Tree
                };
                edges.push(ReactionEdge::from_parts(
                    check(edge.child_node_id)?,
                    kind,
                    EvidenceSet::from_items(edge.reactions),
                    EvidenceSet::from_items(edge.templates),
                ));
            }
            records.push(NodeRecord {
                structure: node.structure_key.map(StructureKey::from),
                value: node.value,
                mean_value: node.mean_value,
                score: node.score,
                visits: node.visits,
                depth: node.depth,
                parent,
                edges,
            });
        }
        if records.is_empty() {
            return Err(invalid("snapshot has no root".to_string()));
        }
        let mut blocked = BTreeSet::new();
        for id in snapshot.blocked {
            if id == 0 || id >= node_count {
                return Err(invalid(format!("cannot block node {id}")));
            }
            blocked.insert(NodeId::from(id));
        }

        let structures = StructureRegistry::from_snapshot(snapshot.structures).map_err(invalid)?;
        let (high, low) = snapshot.rng_word_pos;
        let params = TreeParams {
            seed: snapshot.rng_seed,
            ..params
        };
        SearchTree::from_parts(
            Arena::from_vec(records),
            structures,
            blocked,
            snapshot.target_signature,
            params,
            snapshot.iteration,
            ((high as u128) << 64) | low as u128,
        )
    }
}

fn invalid(reason: String) -> TreeError {
    TreeError::InvalidSnapshot { reason }
}
