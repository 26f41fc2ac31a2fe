mod expansion_tests;
mod property_tree_tests;

use crate::tree::search_tree::{Candidate, SearchTree, TreeParams};

pub(super) type TestTree = SearchTree<String, String, String>;

pub(super) fn params() -> TreeParams {
    TreeParams {
        epsilon: 0.0,
        ..TreeParams::default()
    }
}

pub(super) fn candidate(signature: &str, tversky: f64, reaction: &str, template: &str) -> Candidate<String, String, String> {
    Candidate {
        structure: signature.to_string(),
        signature: signature.to_string(),
        tanimoto: tversky,
        tversky,
        reaction: reaction.to_string(),
        template: template.to_string(),
    }
}

/// Tree with building blocks `A` and `B` under the root.
pub(super) fn seeded_tree(target: &str) -> TestTree {
    let mut tree = TestTree::new(target, params());
    tree.add_seed("A".to_string(), "A".to_string(), 0.3)
        .expect("seed A");
    tree.add_seed("B".to_string(), "B".to_string(), 0.6)
        .expect("seed B");
    tree
}
