//! Thread assembly: flat comment records into a comment forest.
//!
//! Both storage backends persist comments as flat [`CommentRecord`]s and call
//! [`assemble`] on every read, so the tree shape is always a view over the
//! records and never stored state.
//!
//! # Algorithm
//!
//! Two linear passes over index relations rather than owning pointers:
//!
//! 1. Map every comment id to its position in the input.
//! 2. Append each position to its parent's child list, or to the root list
//!    when it has no parent.
//!
//! Owned [`Comment`] values are then built bottom-up from a pre-order walk, so
//! arbitrarily deep reply chains never recurse on the call stack.
//!
//! # Ordering
//!
//! Roots and every `children` list keep the order of the input. Callers feed
//! records in creation order.
//!
//! # Corrupt input
//!
//! A record whose parent is missing from the input is an orphan. Orphans, and
//! anything reachable only through them, are dropped with a warning rather
//! than failing the whole read. Records caught in a parent cycle can never be
//! reached from a root and are dropped the same way. When an id appears more
//! than once, the first record wins.

use crate::domain::{Comment, CommentId, CommentRecord};
use std::collections::HashMap;

/// Build the comment forest for one post from its flat records.
pub fn assemble(records: Vec<CommentRecord>) -> Vec<Comment> {
    let total = records.len();
    if total == 0 {
        return Vec::new();
    }

    // Pass 1: id -> position, first occurrence wins.
    let mut index: HashMap<CommentId, usize> = HashMap::with_capacity(total);
    let mut duplicate = vec![false; total];
    for (pos, record) in records.iter().enumerate() {
        if index.contains_key(&record.id) {
            duplicate[pos] = true;
            tracing::warn!(comment_id = %record.id, "Dropping duplicate comment record");
        } else {
            index.insert(record.id, pos);
        }
    }

    // Pass 2: link children to parents.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); total];
    let mut roots: Vec<usize> = Vec::new();
    for (pos, record) in records.iter().enumerate() {
        if duplicate[pos] {
            continue;
        }
        match record.parent_id {
            None => roots.push(pos),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent_pos) => children[parent_pos].push(pos),
                None => tracing::warn!(
                    comment_id = %record.id,
                    parent_id = %parent_id,
                    "Dropping orphaned comment whose parent is missing"
                ),
            },
        }
    }

    // Pre-order walk from the roots. Anything not visited is unreachable.
    let mut preorder: Vec<usize> = Vec::with_capacity(total);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(pos) = stack.pop() {
        preorder.push(pos);
        stack.extend(children[pos].iter().rev());
    }

    let reachable = preorder.len();
    let kept = total - duplicate.iter().filter(|d| **d).count();
    if reachable < kept {
        tracing::warn!(
            dropped = kept - reachable,
            "Comment records unreachable from any root were dropped"
        );
    }

    // Children always follow their parent in pre-order, so walking it in
    // reverse finishes every subtree before its parent needs it.
    let mut slots: Vec<Option<Comment>> = records
        .into_iter()
        .map(|record| Some(record.into_leaf()))
        .collect();
    let mut built: Vec<Option<Comment>> = vec![None; total];
    for &pos in preorder.iter().rev() {
        let Some(mut node) = slots[pos].take() else {
            continue;
        };
        node.children = children[pos]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[pos] = Some(node);
    }

    roots
        .into_iter()
        .filter_map(|pos| built[pos].take())
        .collect()
}

/// Flatten a forest back into records, in pre-order.
pub fn flatten(forest: &[Comment]) -> Vec<CommentRecord> {
    let mut records = Vec::new();
    let mut stack: Vec<&Comment> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        records.push(CommentRecord::from(node));
        stack.extend(node.children.iter().rev());
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostId;

    fn record(post_id: PostId, parent: Option<CommentId>, content: &str) -> CommentRecord {
        CommentRecord {
            id: CommentId::generate(),
            post_id,
            parent_id: parent,
            author: "tester".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn empty_input_yields_empty_forest() {
        assert!(assemble(Vec::new()).is_empty());
    }

    #[test]
    fn nests_replies_under_parents() {
        let post = PostId::generate();
        let c1 = record(post, None, "c1");
        let c2 = record(post, Some(c1.id), "c2");
        let c3 = record(post, Some(c2.id), "c3");
        let c4 = record(post, None, "c4");

        let forest = assemble(vec![c1.clone(), c2.clone(), c3.clone(), c4.clone()]);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].id, c1.id);
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].id, c2.id);
        assert_eq!(forest[0].children[0].children[0].id, c3.id);
        assert_eq!(forest[1].id, c4.id);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn child_listed_before_parent_still_attaches() {
        let post = PostId::generate();
        let parent = record(post, None, "parent");
        let child = record(post, Some(parent.id), "child");

        let forest = assemble(vec![child.clone(), parent.clone()]);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children[0].id, child.id);
    }

    #[test]
    fn sibling_order_follows_input_order() {
        let post = PostId::generate();
        let root = record(post, None, "root");
        let replies: Vec<_> = (0..5)
            .map(|i| record(post, Some(root.id), &format!("reply-{i}")))
            .collect();

        let mut input = vec![root];
        input.extend(replies.iter().cloned());
        let forest = assemble(input);

        let got: Vec<_> = forest[0].children.iter().map(|c| c.id).collect();
        let want: Vec<_> = replies.iter().map(|r| r.id).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn orphans_and_their_subtrees_are_dropped() {
        let post = PostId::generate();
        let root = record(post, None, "root");
        let orphan = record(post, Some(CommentId::generate()), "orphan");
        let orphan_child = record(post, Some(orphan.id), "orphan-child");

        let forest = assemble(vec![root.clone(), orphan, orphan_child]);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, root.id);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn cycles_are_unreachable_and_dropped() {
        let post = PostId::generate();
        let mut a = record(post, None, "a");
        let b = record(post, Some(a.id), "b");
        a.parent_id = Some(b.id);
        let root = record(post, None, "root");

        let forest = assemble(vec![a, b, root.clone()]);

        assert_eq!(flatten(&forest), vec![root]);
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let post = PostId::generate();
        let first = record(post, None, "first");
        let mut second = record(post, None, "second");
        second.id = first.id;

        let forest = assemble(vec![first, second]);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].content, "first");
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let post = PostId::generate();
        let mut records = vec![record(post, None, "0")];
        for i in 1..10_000 {
            let parent = records[i - 1].id;
            records.push(record(post, Some(parent), "deep"));
        }

        let forest = assemble(records);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].descendant_count(), 9_999);
        assert_eq!(flatten(&forest).len(), 10_000);
    }
}
