use proptest::prelude::*;

use crate::tree::{
    ids::NodeId,
    search_tree::TreeParams,
    tests::{TestTree, candidate},
};

proptest! {
    #[test]
    fn scores_never_fall_below_mean_and_visits_never_drop(
        steps in proptest::collection::vec((0u8..16, 0.0f64..1.0), 1..60),
        epsilon in 0.0f64..0.5,
    ) {
        let mut tree = TestTree::new(
            "TARGET",
            TreeParams { epsilon, max_depth: u64::MAX, ..TreeParams::default() },
        );
        tree.add_seed("S0".into(), "S0".into(), 0.2).unwrap();
        tree.add_seed("S1".into(), "S1".into(), 0.4).unwrap();

        let mut visits: Vec<u64> = Vec::new();
        for (step, (name, value)) in steps.into_iter().enumerate() {
            let leaf = tree.select().unwrap();
            let signature = format!("N{name}");
            let outcome = tree
                .expand(leaf, vec![candidate(&signature, value, &format!("r{step}"), "t")])
                .unwrap();
            let start = outcome.created.first().copied().unwrap_or(leaf);
            tree.backup(start).unwrap();
            tree.advance_iteration();

            for (node_id, node) in tree.nodes() {
                prop_assert!(node.score() >= node.mean_value() - 1e-12);
                if let Some(previous) = visits.get(node_id.index()) {
                    prop_assert!(node.visits() >= *previous);
                }
            }
            visits = tree.nodes().map(|(_, node)| node.visits()).collect();
        }

        // every signature maps to exactly one node
        let mut signatures: Vec<&str> = tree
            .nodes()
            .filter_map(|(node_id, _)| tree.signature_of(node_id).unwrap())
            .collect();
        let total = signatures.len();
        signatures.sort_unstable();
        signatures.dedup();
        prop_assert_eq!(signatures.len(), total);
        prop_assert_eq!(total + 1, tree.node_count());
        prop_assert!(tree.node(NodeId::from(0)).unwrap().is_root());
    }
}
