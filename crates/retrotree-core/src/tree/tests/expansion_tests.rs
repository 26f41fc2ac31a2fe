use crate::tree::{
    edges::EdgeKind,
    error::TreeError,
    ids::NodeId,
    tests::{candidate, seeded_tree},
};

#[test]
fn same_signature_in_one_batch_yields_one_node_with_merged_evidence() {
    let mut tree = seeded_tree("T");
    let a = NodeId::from(1);

    let outcome = tree
        .expand(
            a,
            vec![
                candidate("P", 0.5, "A>>P", "t1"),
                candidate("P", 0.5, "A>>P'", "t2"),
                candidate("Q", 0.4, "A>>Q", "t3"),
            ],
        )
        .expect("expansion succeeds");

    assert_eq!(outcome.created.len(), 2);
    assert_eq!(outcome.merged, 1);
    assert!(!outcome.done);
    assert_eq!(tree.node_count(), 5);

    let p = tree.find_signature("P").expect("P registered");
    let edge = tree.node(a).unwrap().edge_to(p).expect("edge A->P");
    assert_eq!(edge.reactions().len(), 2);
    assert_eq!(edge.templates().len(), 2);
    assert_eq!(edge.kind(), EdgeKind::Tree);
}

#[test]
fn product_already_in_tree_only_grows_evidence() {
    let mut tree = seeded_tree("T");
    let a = NodeId::from(1);
    let b = NodeId::from(2);

    tree.expand(a, vec![candidate("P", 0.5, "A>>P", "t1")])
        .expect("first expansion");
    let p = tree.find_signature("P").expect("P registered");
    let count = tree.node_count();

    tree.expand(b, vec![candidate("P", 0.5, "B>>P", "t2")])
        .expect("second expansion");

    assert_eq!(tree.node_count(), count);
    assert_eq!(tree.node(p).unwrap().parent(), Some(a));
    let cross = tree.node(b).unwrap().edge_to(p).expect("edge B->P");
    assert_eq!(cross.kind(), EdgeKind::CrossLink);
    assert_eq!(tree.node(b).unwrap().tree_children().count(), 0);
    assert_eq!(tree.cross_link_parents(p), vec![b]);
}

#[test]
fn repeated_reaction_on_same_edge_is_stored_once() {
    let mut tree = seeded_tree("T");
    let a = NodeId::from(1);
    tree.expand(
        a,
        vec![
            candidate("P", 0.5, "A>>P", "t1"),
            candidate("P", 0.5, "A>>P", "t1"),
        ],
    )
    .expect("expansion succeeds");

    let p = tree.find_signature("P").unwrap();
    let edge = tree.node(a).unwrap().edge_to(p).unwrap();
    assert_eq!(edge.reactions().len(), 1);
    assert_eq!(edge.templates().len(), 1);
}

#[test]
fn product_equal_to_reactant_is_ignored() {
    let mut tree = seeded_tree("T");
    let a = NodeId::from(1);
    let outcome = tree
        .expand(a, vec![candidate("A", 0.3, "A>>A", "noop")])
        .expect("expansion succeeds");
    assert_eq!(outcome.created.len(), 0);
    assert!(!tree.node(a).unwrap().has_children());
}

#[test]
fn target_candidate_marks_expansion_done() {
    let mut tree = seeded_tree("T");
    let outcome = tree
        .expand(NodeId::from(2), vec![candidate("T", 1.0, "B>>T", "t9")])
        .expect("expansion succeeds");
    assert!(outcome.done);
    assert!(tree.find_signature("T").is_some());
}

#[test]
fn new_nodes_are_scored_at_one_visit() {
    let mut tree = seeded_tree("T");
    tree.expand(NodeId::from(1), vec![candidate("P", 0.99, "A>>P", "t1")])
        .expect("expansion succeeds");
    let p = tree.find_signature("P").unwrap();
    let node = tree.node(p).unwrap();

    assert_eq!(node.visits(), 0);
    assert_eq!(node.depth(), 0);
    assert!((node.mean_value() - 1.69897).abs() < 1e-4);
    // iteration 1 has no exploration bonus
    assert_eq!(node.score(), node.mean_value());
}

#[test]
fn expanding_a_missing_parent_fails() {
    let mut tree = seeded_tree("T");
    let err = tree
        .expand(NodeId::from(42), vec![candidate("P", 0.5, "r", "t")])
        .expect_err("parent does not exist");
    assert_eq!(
        err,
        TreeError::MissingNode {
            node_id: NodeId::from(42)
        }
    );
}

#[test]
fn node_ids_follow_insertion_order() {
    let mut tree = seeded_tree("T");
    let outcome = tree
        .expand(
            NodeId::from(1),
            vec![candidate("P", 0.5, "r1", "t"), candidate("Q", 0.5, "r2", "t")],
        )
        .unwrap();
    assert_eq!(outcome.created, vec![NodeId::from(3), NodeId::from(4)]);
}
