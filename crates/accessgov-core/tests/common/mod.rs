use std::collections::BTreeSet;

use accessgov_core::{
    AccessGroup, AccessGroupWithTargets, ApprovalMethod, Grant, GrantStatus, GroupStatus,
    GroupTarget, Request, RequestStatus, RequestWithGroupsWithTargets, RuleRef, TargetKind,
    Timing,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// 2022-01-01 at `h:m` UTC
#[allow(dead_code)]
pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 1, 1, h, m, 0).unwrap()
}

#[allow(dead_code)]
pub fn grant(status: GrantStatus, start: DateTime<Utc>, end: DateTime<Utc>) -> Grant {
    Grant {
        id: "g-1".to_string(),
        provider: "acme/aws/Account".to_string(),
        subject: "alice".to_string(),
        start,
        end,
        status,
        parameters: Default::default(),
        revoked_by: None,
    }
}

/// A pending request created at 10:00 with ASAP five-minute timing
#[allow(dead_code)]
pub fn request(id: &str, status: RequestStatus) -> Request {
    let mut r = Request::new(
        id.to_string(),
        "alice".to_string(),
        RuleRef {
            id: "rule-1".to_string(),
            version: "v1".to_string(),
        },
        Timing::asap(Duration::minutes(5)),
        ApprovalMethod::Reviewed,
        at(10, 0),
    );
    r.status = status;
    r
}

/// A tree whose group `i` has `shape[i]` targets
#[allow(dead_code)]
pub fn tree(id: &str, shape: &[usize]) -> RequestWithGroupsWithTargets {
    let request = request(id, RequestStatus::Pending);
    let groups = shape
        .iter()
        .enumerate()
        .map(|(gi, n)| {
            let gid = format!("g{}", gi);
            AccessGroupWithTargets {
                group: AccessGroup {
                    id: gid.clone(),
                    request_id: id.to_string(),
                    status: GroupStatus::Pending,
                    request_status: RequestStatus::Pending,
                    request_reviewer_ids: BTreeSet::new(),
                    timing: request.requested_timing,
                    override_timing: None,
                    reviewer_ids: [format!("rev-{}", gi)].into_iter().collect(),
                    created_at: request.created_at,
                    updated_at: request.created_at,
                },
                targets: (0..*n)
                    .map(|ti| GroupTarget {
                        id: format!("t{}", ti),
                        group_id: gid.clone(),
                        request_id: id.to_string(),
                        target_cache_id: format!("cache-{}-{}", gi, ti),
                        target_kind: TargetKind::new("acme", "aws", "Account"),
                        fields: Vec::new(),
                        request_status: RequestStatus::Pending,
                        request_reviewer_ids: BTreeSet::new(),
                        grant: None,
                        created_at: request.created_at,
                        updated_at: request.created_at,
                    })
                    .collect(),
            }
        })
        .collect();

    let mut tree = RequestWithGroupsWithTargets { request, groups };
    tree.sync_denormalized();
    tree
}
