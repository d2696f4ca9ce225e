#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use accessgov_core::ExErrorKind;
use accessgov_store::assemble::{assemble_forward, assemble_page, assemble_reverse};
use accessgov_store::{QueryPage, ScanDirection};
use common::{tree, tree_items};
use proptest::prelude::*;

fn shapes() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..=4, 1..=4)
}

proptest! {
    #[test]
    fn prop_forward_and_reverse_assembly_agree(shape in shapes()) {
        // Given the items of one tree in both scan orders
        let t = tree("r1", &shape);
        let ascending = tree_items(&t);
        let mut descending = ascending.clone();
        descending.reverse();

        // When assembled each way
        let forward = assemble_forward(&ascending).unwrap();
        let reverse = assemble_reverse(&descending).unwrap();

        // Then both give back the original tree
        prop_assert_eq!(&forward, &t);
        prop_assert_eq!(&reverse, &t);
    }
}

#[test]
fn test_empty_slice_is_no_items() {
    let err = assemble_forward(&[]).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_target_without_group_is_orphan() {
    // Given a tree whose second group item is missing
    let items: Vec<_> = tree_items(&tree("r1", &[1, 1]))
        .into_iter()
        .filter(|i| i.key.sk != "REQUEST#r1#GROUP#g1#")
        .collect();

    // When assembled
    let err = assemble_forward(&items).unwrap_err();

    // Then the dangling target is reported
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(err.entity_id(), Some("REQUEST#r1#GROUP#g1#TARGET#t0#"));
}

#[test]
fn test_reverse_requires_request_last() {
    let items = tree_items(&tree("r1", &[1]));
    let err = assemble_reverse(&items).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_empty_page_yields_nothing() {
    let page = assemble_page(QueryPage::default(), ScanDirection::Forward, None).unwrap();
    assert!(page.trees.is_empty());
    assert!(page.next_cursor.is_none());
}

#[test]
fn test_wrong_count_inside_page_is_constraint_violation() {
    // Given a first request that claims more targets than it has, followed by another
    let mut first_items = tree_items(&tree("r1", &[1]));
    first_items[0].data["group_target_count"] = serde_json::json!(3);
    let mut items = Vec::new();
    items.extend(first_items);
    items.extend(tree_items(&tree("r2", &[1])));

    // When the page is assembled
    let err = assemble_page(
        QueryPage {
            items,
            last_evaluated: None,
        },
        ScanDirection::Forward,
        None,
    )
    .unwrap_err();

    // Then the contradiction is reported, not skipped
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert_eq!(err.entity_id(), Some("r1"));
}
