#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use accessgov_core::{AccessError, GrantStatus, GroupStatus, RequestStatus};
use common::{at, grant, tree};

#[test]
fn test_sync_denormalized_counts_targets_and_unions_reviewers() {
    let t = tree("r1", &[2, 3]);

    assert_eq!(t.request.group_target_count, 5);
    assert_eq!(
        t.request.reviewer_ids.iter().cloned().collect::<Vec<_>>(),
        vec!["rev-0".to_string(), "rev-1".to_string()]
    );
    for g in &t.groups {
        assert_eq!(g.group.request_reviewer_ids, t.request.reviewer_ids);
        for target in &g.targets {
            assert_eq!(target.request_reviewer_ids, t.request.reviewer_ids);
        }
    }
}

#[test]
fn test_set_status_cascades_to_every_child() {
    let mut t = tree("r1", &[1, 2]);

    t.set_status(RequestStatus::Approved, at(11, 0));

    assert_eq!(t.request.status, RequestStatus::Approved);
    assert_eq!(t.request.updated_at, at(11, 0));
    for g in &t.groups {
        assert_eq!(g.group.status, GroupStatus::Approved);
        assert_eq!(g.group.request_status, RequestStatus::Approved);
        for target in &g.targets {
            assert_eq!(target.request_status, RequestStatus::Approved);
            assert_eq!(target.updated_at, at(11, 0));
        }
    }
}

#[test]
fn test_cancel_leaves_group_status() {
    let mut t = tree("r1", &[1]);
    t.set_status(RequestStatus::Cancelled, at(11, 0));

    assert_eq!(t.groups[0].group.status, GroupStatus::Pending);
    assert_eq!(t.groups[0].group.request_status, RequestStatus::Cancelled);
}

#[test]
fn test_find_target_reports_missing_level() {
    let t = tree("r1", &[1]);

    assert!(t.find_target("g0", "t0").is_ok());
    assert!(matches!(
        t.find_target("g9", "t0"),
        Err(AccessError::GroupNotFound { .. })
    ));
    assert!(matches!(
        t.find_target("g0", "t9"),
        Err(AccessError::TargetNotFound { .. })
    ));
}

#[test]
fn test_request_grant_envelope() {
    // Given two target grants with different windows and statuses
    let mut t = tree("r1", &[2]);
    t.groups[0].targets[0].grant = Some(grant(GrantStatus::Expired, at(9, 0), at(10, 0)));
    t.groups[0].targets[1].grant = Some(grant(GrantStatus::Active, at(10, 0), at(12, 0)));

    // When the request grant is derived
    t.derive_request_grant();

    // Then it spans both windows and takes the most live status
    let g = t.request.grant.as_ref().unwrap();
    assert_eq!(g.start, at(9, 0));
    assert_eq!(g.end, at(12, 0));
    assert_eq!(g.status, GrantStatus::Active);
    assert_eq!(g.subject, "alice");
}

#[test]
fn test_fully_revoked_envelope_keeps_revoker() {
    let mut t = tree("r1", &[1]);
    let mut revoked = grant(GrantStatus::Revoked, at(10, 0), at(12, 0));
    revoked.revoked_by = Some("bob".to_string());
    t.groups[0].targets[0].grant = Some(revoked);
    t.request.status = RequestStatus::Approved;

    t.derive_request_grant();

    let g = t.request.grant.as_ref().unwrap();
    assert_eq!(g.status, GrantStatus::Revoked);
    assert_eq!(g.revoked_by.as_deref(), Some("bob"));
    // a revoked envelope moves the request back to its creation instant
    assert_eq!(t.request.end_time(), at(10, 0));
}

#[test]
fn test_no_target_grants_means_no_request_grant() {
    let mut t = tree("r1", &[1]);
    t.derive_request_grant();
    assert!(t.request.grant.is_none());
}

#[test]
fn test_reviewers_carry_request_copy() {
    let t = tree("r1", &[1, 1]);
    let reviewers = t.reviewers();

    assert_eq!(reviewers.len(), 2);
    assert!(reviewers.iter().all(|r| r.request == t.request));
}
