//! Property tests for comment thread assembly.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use threadkeep::domain::{Comment, CommentId, CommentRecord, PostId};
use threadkeep::thread::{assemble, flatten};

/// A valid forest as a list of parent choices: entry `i` is either `None`
/// (a root) or the index of an earlier record.
fn forest_shape() -> impl Strategy<Value = Vec<Option<usize>>> {
    (0usize..60).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    prop_oneof![1 => Just(None), 3 => (0..i).prop_map(Some)].boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn records_for(shape: &[Option<usize>]) -> Vec<CommentRecord> {
    let post_id = PostId::generate();
    let ids: Vec<CommentId> = shape.iter().map(|_| CommentId::generate()).collect();
    shape
        .iter()
        .enumerate()
        .map(|(i, parent)| CommentRecord {
            id: ids[i],
            post_id,
            parent_id: parent.map(|p| ids[p]),
            author: format!("author{}", i % 3),
            content: format!("comment {i}"),
        })
        .collect()
}

/// Every node's children point back at it, and siblings keep input order.
fn assert_well_formed(forest: &[Comment], position: &HashMap<CommentId, usize>) {
    let mut stack: Vec<(&Comment, Option<CommentId>)> =
        forest.iter().map(|c| (c, None)).collect();
    assert!(forest.windows(2).all(|w| position[&w[0].id] < position[&w[1].id]));

    while let Some((node, parent)) = stack.pop() {
        assert_eq!(node.parent_id, parent);
        assert!(node
            .children
            .windows(2)
            .all(|w| position[&w[0].id] < position[&w[1].id]));
        stack.extend(node.children.iter().map(|c| (c, Some(node.id))));
    }
}

proptest! {
    #[test]
    fn flatten_inverts_assemble(shape in forest_shape()) {
        let records = records_for(&shape);
        let forest = assemble(records.clone());

        let expected: HashSet<CommentRecord> = records.into_iter().collect();
        let actual: HashSet<CommentRecord> = flatten(&forest).into_iter().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn assembly_ignores_input_order(
        (shape, order) in forest_shape().prop_flat_map(|shape| {
            let n = shape.len();
            (Just(shape), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
        })
    ) {
        let records = records_for(&shape);
        let in_order = assemble(records.clone());

        let shuffled: Vec<CommentRecord> = order.iter().map(|&i| records[i].clone()).collect();
        let reordered = assemble(shuffled.clone());

        let a: HashSet<CommentRecord> = flatten(&in_order).into_iter().collect();
        let b: HashSet<CommentRecord> = flatten(&reordered).into_iter().collect();
        prop_assert_eq!(a, b);

        let position: HashMap<CommentId, usize> =
            shuffled.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
        assert_well_formed(&reordered, &position);
    }

    #[test]
    fn comment_count_matches_records(shape in forest_shape()) {
        let records = records_for(&shape);
        let total = records.len();
        let forest = assemble(records);

        let counted: usize = forest.iter().map(|c| 1 + c.descendant_count()).sum();
        prop_assert_eq!(counted, total);
    }
}

#[test]
fn orphans_are_dropped_not_fatal() {
    let mut records = records_for(&[None, Some(0), Some(1)]);
    // Point the middle record at a parent that does not exist.
    records[1].parent_id = Some(CommentId::generate());

    let forest = assemble(records.clone());
    let kept: Vec<CommentId> = flatten(&forest).iter().map(|r| r.id).collect();
    assert_eq!(kept, vec![records[0].id]);
}
