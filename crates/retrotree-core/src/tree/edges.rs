use crate::tree::{evidence::EvidenceSet, ids::NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How an edge relates to the traversal tree.
pub enum EdgeKind {
    /// The parent created the child; selection and backup follow these.
    Tree,
    /// The child already existed under another parent.
    /// Only evidence is recorded, traversal never follows it.
    CrossLink,
}

#[derive(Debug, Clone)]
/// Represents "this parent can be turned into that child".
/// Holds every distinct reaction and template that justifies the transformation.
pub struct ReactionEdge<R, T> {
    child: NodeId,
    kind: EdgeKind,
    reactions: EvidenceSet<R>,
    templates: EvidenceSet<T>,
}

impl<R: PartialEq, T: PartialEq> ReactionEdge<R, T> {
    /// Edge without evidence, used for building blocks hanging off the root.
    pub fn bare(child: NodeId) -> Self {
        ReactionEdge {
            child,
            kind: EdgeKind::Tree,
            reactions: EvidenceSet::new(),
            templates: EvidenceSet::new(),
        }
    }

    /// Edge carrying one reaction and one template.
    pub fn new(child: NodeId, kind: EdgeKind, reaction: R, template: T) -> Self {
        ReactionEdge {
            child,
            kind,
            reactions: EvidenceSet::singleton(reaction),
            templates: EvidenceSet::singleton(template),
        }
    }

    pub(crate) fn from_parts(
        child: NodeId,
        kind: EdgeKind,
        reactions: EvidenceSet<R>,
        templates: EvidenceSet<T>,
    ) -> Self {
        ReactionEdge {
            child,
            kind,
            reactions,
            templates,
        }
    }

    /// Merge one more piece of evidence into the edge.
    pub fn record(&mut self, reaction: R, template: T) {
        self.reactions.insert(reaction);
        self.templates.insert(template);
    }

    pub fn child(&self) -> NodeId {
        self.child
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn is_tree_edge(&self) -> bool {
        self.kind == EdgeKind::Tree
    }

    pub fn reactions(&self) -> &EvidenceSet<R> {
        &self.reactions
    }

    pub fn templates(&self) -> &EvidenceSet<T> {
        &self.templates
    }
}
