#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use accessgov_core::{ExErrorKind, RequestWithGroupsWithTargets};
use accessgov_store::access::{ListRequestsForUser, ListRequestsWithGroupsWithTargets};
use accessgov_store::{run_all, run_query, MemoryStore, QueryOptions};
use chrono::Duration;
use common::{at, tree, tree_for, write_tree};
use proptest::prelude::*;

/// Items one tree occupies in the request partition
fn item_count(t: &RequestWithGroupsWithTargets) -> usize {
    1 + t.groups.len() + t.target_count()
}

fn forest() -> impl Strategy<Value = Vec<(Vec<usize>, u32)>> {
    prop::collection::vec(
        (prop::collection::vec(1usize..=3, 1..=3), 0u32..120),
        1..=6,
    )
}

fn build(spec: &[(Vec<usize>, u32)]) -> Vec<RequestWithGroupsWithTargets> {
    spec.iter()
        .enumerate()
        .map(|(i, (shape, offset))| {
            tree_for(
                &format!("r{:02}", i),
                "alice",
                at(10, 0) + Duration::minutes(i64::from(*offset)),
                shape,
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_forward_pages_never_split_a_tree(spec in forest(), page_size in 1usize..=20) {
        // Given a partition of trees and an arbitrary page size
        let store = MemoryStore::new();
        let trees = build(&spec);
        for t in &trees {
            write_tree(&store, t);
        }
        let largest = trees.iter().map(item_count).max().unwrap();

        // When every page is read
        let mut q = ListRequestsWithGroupsWithTargets::new();
        let outcome = run_all(&store, &mut q, QueryOptions::with_page_size(page_size));

        // Then either every tree comes back whole and in key order,
        // or the page is too small for some tree and the read fails loudly
        if page_size >= largest {
            prop_assert!(outcome.is_ok());
            prop_assert_eq!(&q.trees, &trees);
        } else {
            prop_assert_eq!(outcome.unwrap_err().kind(), ExErrorKind::EntityTooLarge);
        }
    }

    #[test]
    fn prop_reverse_pages_never_split_a_tree(spec in forest(), page_size in 1usize..=20) {
        // Given the same trees read newest-first from the user index
        let store = MemoryStore::new();
        let mut trees = build(&spec);
        for t in &trees {
            write_tree(&store, t);
        }
        let largest = trees.iter().map(item_count).max().unwrap();
        trees.sort_by(|a, b| {
            (b.request.end_time(), &b.request.id).cmp(&(a.request.end_time(), &a.request.id))
        });

        // When every page is read
        let mut q = ListRequestsForUser::new("alice");
        let outcome = run_all(&store, &mut q, QueryOptions::with_page_size(page_size));

        // Then the trees come back whole, latest end time first
        if page_size >= largest {
            prop_assert!(outcome.is_ok());
            prop_assert_eq!(&q.trees, &trees);
        } else {
            prop_assert_eq!(outcome.unwrap_err().kind(), ExErrorKind::EntityTooLarge);
        }
    }
}

#[test]
fn test_cut_tree_moves_to_next_page() {
    // Given two trees of 3 and 4 items
    let store = MemoryStore::new();
    let (a, b) = (tree("r1", &[1]), tree("r2", &[2]));
    write_tree(&store, &a);
    write_tree(&store, &b);

    // When a page of 5 items is read
    let mut q = ListRequestsWithGroupsWithTargets::new();
    let outcome = run_query(&store, &mut q, QueryOptions::with_page_size(5)).unwrap();

    // Then only the first tree is returned and the cursor sits on its last item
    assert_eq!(q.trees, vec![a.clone()]);
    let cursor = outcome.next_cursor.clone().unwrap();
    assert_eq!(cursor.key.sk, "REQUEST#r1#GROUP#g0#TARGET#t0#");

    // And the next page starts with the second tree
    let outcome = run_query(
        &store,
        &mut q,
        QueryOptions {
            page_size: Some(5),
            cursor: outcome.next_cursor,
        },
    )
    .unwrap();
    assert_eq!(q.trees, vec![a, b]);
    assert!(!outcome.has_more());
}

#[test]
fn test_tree_larger_than_page_is_fatal() {
    // Given one tree of 1 + 1 + 6 items
    let store = MemoryStore::new();
    write_tree(&store, &tree("r1", &[6]));

    // When read with pages of 4
    let mut q = ListRequestsWithGroupsWithTargets::new();
    let err = run_query(&store, &mut q, QueryOptions::with_page_size(4)).unwrap_err();

    // Then the read fails rather than returning a partial tree
    assert_eq!(err.kind(), ExErrorKind::EntityTooLarge);
    assert_eq!(err.entity_id(), Some("r1"));
    assert!(q.trees.is_empty());
}

#[test]
fn test_cursor_token_round_trip_resumes() {
    let store = MemoryStore::new();
    for id in ["r1", "r2", "r3"] {
        write_tree(&store, &tree(id, &[1]));
    }

    let mut q = ListRequestsWithGroupsWithTargets::new();
    let outcome = run_query(&store, &mut q, QueryOptions::with_page_size(3)).unwrap();
    let token = outcome.next_token().unwrap().unwrap();

    let options = QueryOptions::from_token(Some(3), Some(&token)).unwrap();
    let mut rest = ListRequestsWithGroupsWithTargets::new();
    run_all(&store, &mut rest, options).unwrap();

    let ids: Vec<&str> = rest.trees.iter().map(|t| t.request.id.as_str()).collect();
    assert_eq!(ids, vec!["r2", "r3"]);
}

#[test]
fn test_malformed_token_is_invalid_cursor() {
    let err = QueryOptions::from_token(Some(3), Some("@@@")).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidCursor);
}

#[test]
fn test_zero_page_size_rejected() {
    let store = MemoryStore::new();
    let mut q = ListRequestsWithGroupsWithTargets::new();
    let err = run_query(&store, &mut q, QueryOptions::with_page_size(0)).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}
