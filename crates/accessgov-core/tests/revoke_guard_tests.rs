#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use accessgov_core::errors::{ExError, ExErrorKind};
use accessgov_core::{AccessError, GrantStatus};
use common::{at, grant};

#[test]
fn test_active_grant_with_future_end_is_revocable() {
    let g = grant(GrantStatus::Active, at(10, 0), at(11, 0));
    assert!(g.ensure_revocable(at(10, 30)).is_ok());
}

#[test]
fn test_pending_grant_is_revocable() {
    let g = grant(GrantStatus::Pending, at(10, 0), at(11, 0));
    assert!(g.ensure_revocable(at(9, 0)).is_ok());
}

#[test]
fn test_grant_past_its_end_is_inactive() {
    let g = grant(GrantStatus::Active, at(10, 0), at(11, 0));

    let err = g.ensure_revocable(at(11, 0)).unwrap_err();
    assert!(matches!(err, AccessError::InactiveGrant { .. }));

    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::InactiveGrant);
}

#[test]
fn test_non_active_statuses_are_inactive() {
    for status in [
        GrantStatus::Revoked,
        GrantStatus::Expired,
        GrantStatus::Error,
    ] {
        let g = grant(status, at(10, 0), at(23, 0));
        assert!(
            matches!(
                g.ensure_revocable(at(10, 30)),
                Err(AccessError::InactiveGrant { .. })
            ),
            "{:?} should not be revocable",
            status
        );
    }
}
