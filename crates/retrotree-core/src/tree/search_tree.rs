use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    structures::StructureRegistry,
    tree::{
        arena::Arena,
        edges::EdgeKind,
        error::TreeError,
        ids::{NodeId, StructureKey},
        node::NodeRecord,
        stats,
    },
};

/// Tuning knobs the tree needs during selection and scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Probability of picking a random child instead of the best one.
    pub epsilon: f64,
    /// Children whose depth reaches this bound are not selected greedily.
    pub max_depth: u64,
    /// Weight of the exploration term in the UCB score.
    pub exploration: f64,
    /// Seed for the selection RNG.
    pub seed: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            epsilon: 0.05,
            max_depth: 5,
            exploration: std::f64::consts::SQRT_2,
            seed: 11,
        }
    }
}

#[derive(Debug, Clone)]
/// One product proposed for expansion, with the evidence that produced it.
pub struct Candidate<M, R, T> {
    pub structure: M,
    /// Canonical string of `structure`.
    pub signature: String,
    pub tanimoto: f64,
    pub tversky: f64,
    pub reaction: R,
    pub template: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// What a single expansion call changed.
pub struct ExpansionOutcome {
    /// Nodes allocated by this call, in candidate order.
    pub created: Vec<NodeId>,
    /// Candidates folded into an existing node's edge.
    pub merged: usize,
    /// A candidate was the target itself.
    pub done: bool,
}

#[derive(Debug, Clone)]
/// The MCTS graph over candidate molecules.
///
/// Owns the node arena (root at index 0), the structure registry and the
/// signature index used for deduplication. Traversal follows tree edges only,
/// so every node has exactly one parent for selection and backup purposes.
/// Inner nodes whose children were all filtered out during selection are
/// blocked and never entered again.
pub struct SearchTree<M, R, T> {
    arena: Arena<NodeRecord<R, T>>,
    structures: StructureRegistry<M>,
    by_signature: HashMap<String, NodeId>,
    blocked: BTreeSet<NodeId>,
    target_signature: String,
    params: TreeParams,
    iteration: u64,
    rng: ChaCha8Rng,
}

impl<M, R, T> SearchTree<M, R, T>
where
    R: Clone + PartialEq,
    T: Clone + PartialEq,
{
    /// Create a tree holding only the root sentinel.
    pub fn new(target_signature: impl Into<String>, params: TreeParams) -> Self {
        let mut arena = Arena::new();
        let _ = arena.allocate(NodeRecord::root());
        SearchTree {
            arena,
            structures: StructureRegistry::new(),
            by_signature: HashMap::new(),
            blocked: BTreeSet::new(),
            target_signature: target_signature.into(),
            params,
            iteration: 1,
            rng: ChaCha8Rng::seed_from_u64(params.seed),
        }
    }

    pub(crate) fn from_parts(
        arena: Arena<NodeRecord<R, T>>,
        structures: StructureRegistry<M>,
        blocked: BTreeSet<NodeId>,
        target_signature: String,
        params: TreeParams,
        iteration: u64,
        rng_word_pos: u128,
    ) -> Result<Self, TreeError> {
        let mut by_signature = HashMap::new();
        for (node_id, node) in arena.enumerate() {
            if let Some(key) = node.structure() {
                let signature = structures
                    .canonical(key)
                    .ok_or(TreeError::MissingStructure { key })?;
                by_signature.insert(signature.to_string(), node_id);
            }
        }
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        rng.set_word_pos(rng_word_pos);
        Ok(SearchTree {
            arena,
            structures,
            by_signature,
            blocked,
            target_signature,
            params,
            iteration,
            rng,
        })
    }

    pub fn root_id(&self) -> NodeId {
        NodeId::from(0)
    }

    /// Number of nodes including the root.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Swap the tuning knobs. The selection RNG keeps its seed and position;
    /// a new depth bound releases every blocked branch.
    pub fn set_params(&mut self, params: TreeParams) {
        if params.max_depth != self.params.max_depth {
            self.blocked.clear();
        }
        self.params = TreeParams {
            seed: self.params.seed,
            ..params
        };
    }

    pub fn target_signature(&self) -> &str {
        &self.target_signature
    }

    /// Total iteration counter fed into the exploration term.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn advance_iteration(&mut self) {
        self.iteration += 1;
    }

    pub(crate) fn rng_word_pos(&self) -> u128 {
        self.rng.get_word_pos()
    }

    pub fn structures(&self) -> &StructureRegistry<M> {
        &self.structures
    }

    pub fn node(&self, node_id: NodeId) -> Result<&NodeRecord<R, T>, TreeError> {
        self.arena
            .get(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    fn node_mut(&mut self, node_id: NodeId) -> Result<&mut NodeRecord<R, T>, TreeError> {
        self.arena
            .get_mut(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeRecord<R, T>)> {
        self.arena.enumerate()
    }

    /// Shared structure held by a node; `None` for the root.
    pub fn structure_of(&self, node_id: NodeId) -> Result<Option<&Arc<M>>, TreeError> {
        match self.node(node_id)?.structure() {
            None => Ok(None),
            Some(key) => self
                .structures
                .get(key)
                .map(Some)
                .ok_or(TreeError::MissingStructure { key }),
        }
    }

    /// Canonical string of a node's structure; `None` for the root.
    pub fn signature_of(&self, node_id: NodeId) -> Result<Option<&str>, TreeError> {
        match self.node(node_id)?.structure() {
            None => Ok(None),
            Some(key) => self
                .structures
                .canonical(key)
                .map(Some)
                .ok_or(TreeError::MissingStructure { key }),
        }
    }

    /// Node currently holding a canonical signature.
    pub fn find_signature(&self, signature: &str) -> Option<NodeId> {
        self.by_signature.get(signature).copied()
    }

    /// Whether selection has written this branch off.
    pub fn is_blocked(&self, node_id: NodeId) -> bool {
        self.blocked.contains(&node_id)
    }

    pub fn blocked_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.blocked.iter().copied()
    }

    fn is_target(&self, node_id: NodeId) -> Result<bool, TreeError> {
        Ok(self.signature_of(node_id)? == Some(self.target_signature.as_str()))
    }

    /// Attach a building block directly under the root.
    /// Returns `None` when the signature is already in the tree.
    pub fn add_seed(
        &mut self,
        structure: M,
        signature: String,
        value: f64,
    ) -> Result<Option<NodeId>, TreeError> {
        if self.by_signature.contains_key(&signature) {
            return Ok(None);
        }
        let root = self.root_id();
        let child = self.allocate(root, structure, signature, value);
        self.node_mut(root)?.push_bare_edge(child);
        Ok(Some(child))
    }

    fn allocate(&mut self, parent: NodeId, structure: M, signature: String, value: f64) -> NodeId {
        let node_id = self.arena.next_id();
        let key = StructureKey::from(node_id);
        self.structures.insert(key, structure, signature.clone());
        self.by_signature.insert(signature, node_id);
        self.arena.allocate(NodeRecord::discovered(
            key,
            value,
            parent,
            self.iteration,
            self.params.exploration,
        ))
    }

    /// Descend from the root to a leaf.
    ///
    /// With probability `epsilon` a random non-target child is taken, otherwise
    /// the highest-scoring child below the depth bound. Blocked nodes are never
    /// entered. An inner node whose children are all filtered out is blocked and
    /// the descent restarts from the root; only an exhausted root yields
    /// `TreeError::NoCandidates`.
    pub fn select(&mut self) -> Result<NodeId, TreeError> {
        let root = self.root_id();
        let mut current = root;
        loop {
            let children: Vec<NodeId> = self.node(current)?.tree_children().collect();
            if children.is_empty() {
                return Ok(current);
            }
            let next = if self.rng.r#gen::<f64>() < self.params.epsilon {
                self.random_child(current, &children)
            } else {
                self.best_child(current, &children)
            };
            current = match next {
                Ok(child) => child,
                Err(TreeError::NoCandidates { node_id }) if node_id != root => {
                    debug!(node = %node_id, "no candidates below node, branch blocked");
                    self.blocked.insert(node_id);
                    root
                }
                Err(err) => return Err(err),
            };
        }
    }

    fn random_child(&mut self, node_id: NodeId, children: &[NodeId]) -> Result<NodeId, TreeError> {
        let mut candidates = Vec::with_capacity(children.len());
        for &child in children {
            if !self.is_blocked(child) && !self.is_target(child)? {
                candidates.push(child);
            }
        }
        candidates
            .choose(&mut self.rng)
            .copied()
            .ok_or(TreeError::NoCandidates { node_id })
    }

    fn best_child(&self, node_id: NodeId, children: &[NodeId]) -> Result<NodeId, TreeError> {
        let mut best: Option<(NodeId, f64)> = None;
        for &child in children {
            let node = self.node(child)?;
            if node.depth() >= self.params.max_depth
                || self.is_blocked(child)
                || self.is_target(child)?
            {
                continue;
            }
            // ties keep the earlier child
            match best {
                Some((_, score)) if score >= node.score() => {}
                _ => best = Some((child, node.score())),
            }
        }
        best.map(|(child, _)| child)
            .ok_or(TreeError::NoCandidates { node_id })
    }

    /// Grow the tree below `parent` with one batch of candidates.
    ///
    /// A signature seen for the first time gets a new node and a tree edge.
    /// A signature already present, in this batch or anywhere in the tree,
    /// only adds its reaction and template to the edge from `parent`.
    pub fn expand<I>(&mut self, parent: NodeId, candidates: I) -> Result<ExpansionOutcome, TreeError>
    where
        I: IntoIterator<Item = Candidate<M, R, T>>,
    {
        self.node(parent)?;
        let mut outcome = ExpansionOutcome::default();

        for candidate in candidates {
            if candidate.signature == self.target_signature {
                outcome.done = true;
                info!("{0} TARGET RECEIVED {0}", "=".repeat(20));
            }

            match self.by_signature.get(&candidate.signature).copied() {
                Some(existing) if existing == parent => {
                    debug!(node = %parent, "candidate equals its own reactant, ignored");
                }
                Some(existing) => {
                    let kind = if self.node(existing)?.parent() == Some(parent) {
                        EdgeKind::Tree
                    } else {
                        EdgeKind::CrossLink
                    };
                    self.node_mut(parent)?.record_edge(
                        existing,
                        kind,
                        candidate.reaction,
                        candidate.template,
                    );
                    outcome.merged += 1;
                }
                None => {
                    let child = self.allocate(
                        parent,
                        candidate.structure,
                        candidate.signature,
                        candidate.tversky,
                    );
                    self.node_mut(parent)?.record_edge(
                        child,
                        EdgeKind::Tree,
                        candidate.reaction,
                        candidate.template,
                    );
                    outcome.created.push(child);
                }
            }
        }

        Ok(outcome)
    }

    /// Walk from `leaf` up the parent chain, refreshing visits, values and depth.
    pub fn backup(&mut self, leaf: NodeId) -> Result<(), TreeError> {
        let root = self.root_id();
        let mut current = leaf;
        let mut depth = self.node(leaf)?.depth();

        while let Some(parent) = self.node(current)?.parent() {
            self.refresh(current)?;
            if parent != root {
                depth += 1;
                self.node_mut(parent)?.depth += depth;
            }
            current = parent;
        }
        Ok(())
    }

    fn refresh(&mut self, node_id: NodeId) -> Result<(), TreeError> {
        let (child_scores, child_means) = {
            let node = self.node(node_id)?;
            let mut scores = Vec::new();
            let mut means = Vec::new();
            for child in node.tree_children() {
                let child = self.node(child)?;
                scores.push(child.score());
                means.push(child.mean_value());
            }
            (scores, means)
        };

        let iteration = self.iteration;
        let exploration = self.params.exploration;
        let node = self.node_mut(node_id)?;
        node.visits += 1;

        let from_children = child_scores.iter().any(|score| *score != 0.0);
        match (
            from_children,
            stats::average(&child_scores),
            stats::average(&child_means),
        ) {
            (true, Some(score), Some(mean)) => {
                node.score = score;
                node.mean_value = mean;
            }
            _ => {
                node.mean_value = stats::mean_value(node.value, node.visits);
                node.score = stats::ucb_score(node.mean_value, iteration, node.visits, exploration);
            }
        }
        Ok(())
    }

    /// Highest-scoring node that has been expanded at least once.
    pub fn best_reagent(&self) -> Result<NodeId, TreeError> {
        let mut best: Option<(NodeId, f64)> = None;
        for (node_id, node) in self.arena.enumerate() {
            if node.is_root() || !node.has_children() {
                continue;
            }
            match best {
                Some((_, score)) if score >= node.score() => {}
                _ => best = Some((node_id, node.score())),
            }
        }
        best.map(|(node_id, _)| node_id).ok_or(TreeError::EmptyTree)
    }

    /// Node ids from the root down to `node_id`, following tree parents.
    pub fn path_to(&self, node_id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = vec![node_id];
        let mut current = node_id;
        while let Some(parent) = self.node(current)?.parent() {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Parents that reach `node_id` through a cross-link edge.
    pub fn cross_link_parents(&self, node_id: NodeId) -> Vec<NodeId> {
        self.arena
            .enumerate()
            .filter(|(_, node)| {
                node.edges()
                    .iter()
                    .any(|edge| edge.child() == node_id && !edge.is_tree_edge())
            })
            .map(|(parent, _)| parent)
            .collect()
    }
}
