use crate::tree::{
    edges::{EdgeKind, ReactionEdge},
    ids::{NodeId, StructureKey},
    stats,
};

#[derive(Debug, Clone)]
/// One candidate molecule in the search tree, plus the edges leaving it.
///
/// `value` is the Tversky similarity to the target measured when the node was created.
/// `mean_value`, `score`, `visits` and `depth` only change during backup.
pub struct NodeRecord<R, T> {
    pub(crate) structure: Option<StructureKey>,
    pub(crate) value: f64,
    pub(crate) mean_value: f64,
    pub(crate) score: f64,
    pub(crate) visits: u64,
    pub(crate) depth: u64,
    pub(crate) parent: Option<NodeId>,
    pub(crate) edges: Vec<ReactionEdge<R, T>>,
}

impl<R: PartialEq, T: PartialEq> NodeRecord<R, T> {
    /// The sentinel "no molecule yet" node.
    pub fn root() -> Self {
        NodeRecord {
            structure: None,
            value: 0.01,
            mean_value: 0.0,
            score: 0.0,
            visits: 0,
            depth: 0,
            parent: None,
            edges: Vec::new(),
        }
    }

    /// A freshly discovered molecule, scored as if it had been visited once.
    pub fn discovered(
        structure: StructureKey,
        value: f64,
        parent: NodeId,
        iteration: u64,
        exploration: f64,
    ) -> Self {
        let mean_value = stats::mean_value(value, 1);
        NodeRecord {
            structure: Some(structure),
            value,
            mean_value,
            score: stats::ucb_score(mean_value, iteration, 1, exploration),
            visits: 0,
            depth: 0,
            parent: Some(parent),
            edges: Vec::new(),
        }
    }

    pub fn structure(&self) -> Option<StructureKey> {
        self.structure
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn mean_value(&self) -> f64 {
        self.mean_value
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }

    pub fn depth(&self) -> u64 {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.structure.is_none()
    }

    /// Every outgoing edge, tree edges and cross-links alike.
    pub fn edges(&self) -> &[ReactionEdge<R, T>] {
        &self.edges
    }

    /// Children this node created; the only ones selection descends into.
    pub fn tree_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .iter()
            .filter(|edge| edge.is_tree_edge())
            .map(|edge| edge.child())
    }

    pub fn has_children(&self) -> bool {
        !self.edges.is_empty()
    }

    pub fn edge_to(&self, child: NodeId) -> Option<&ReactionEdge<R, T>> {
        self.edges.iter().find(|edge| edge.child() == child)
    }

    /// Add evidence to the edge towards `child`, creating the edge if needed.
    pub(crate) fn record_edge(&mut self, child: NodeId, kind: EdgeKind, reaction: R, template: T) {
        match self.edges.iter_mut().find(|edge| edge.child() == child) {
            Some(edge) => edge.record(reaction, template),
            None => self
                .edges
                .push(ReactionEdge::new(child, kind, reaction, template)),
        }
    }

    pub(crate) fn push_bare_edge(&mut self, child: NodeId) {
        if self.edge_to(child).is_none() {
            self.edges.push(ReactionEdge::bare(child));
        }
    }
}
