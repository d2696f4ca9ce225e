//! Cascade planning
//!
//! A request's status, reviewer set and end time are copied onto every group,
//! target and reviewer association it owns. Instead of patching those copies
//! one by one, a command mutates the authoritative tree and asks for the full
//! list of items that now describe it. Nothing here touches a store.

use std::collections::BTreeSet;

use accessgov_core::RequestWithGroupsWithTargets;

use crate::errors::Result;
use crate::item::{PrimaryKey, RawItem};
use crate::keys;

/// Items to write and keys to remove so the store matches one request tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadePlan {
    pub puts: Vec<RawItem>,
    pub deletes: Vec<PrimaryKey>,
}

impl CascadePlan {
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }
}

/// Every item of `tree`: the request, its groups, its targets and one
/// reviewer association per id in the request's reviewer set.
///
/// Denormalized fields are re-derived on a copy first, so a caller that
/// forgot to sync still gets consistent items.
///
/// # Errors
///
/// Returns `Serialization` if an entity cannot be encoded.
pub fn plan_request_items(tree: &RequestWithGroupsWithTargets) -> Result<Vec<RawItem>> {
    let mut tree = tree.clone();
    tree.sync_denormalized();

    let request = &tree.request;
    let mut items = Vec::with_capacity(1 + tree.groups.len() + tree.target_count());
    items.push(RawItem::from_request(request)?);
    for g in &tree.groups {
        items.push(RawItem::from_group(&g.group, request)?);
        for t in &g.targets {
            items.push(RawItem::from_target(t, request)?);
        }
    }
    for reviewer in tree.reviewers() {
        items.push(RawItem::from_reviewer(&reviewer)?);
    }
    Ok(items)
}

/// Rewrite of an existing tree.
///
/// `previous_reviewers` is the reviewer set as stored before the change; any
/// association for a reviewer no longer on the request is deleted.
///
/// # Errors
///
/// As [`plan_request_items`].
pub fn plan_request_update(
    tree: &RequestWithGroupsWithTargets,
    previous_reviewers: &BTreeSet<String>,
) -> Result<CascadePlan> {
    let puts = plan_request_items(tree)?;
    let mut current = tree.request.reviewer_ids.clone();
    for g in &tree.groups {
        current.extend(g.group.reviewer_ids.iter().cloned());
    }
    let deletes = previous_reviewers
        .difference(&current)
        .map(|reviewer_id| reviewer_key(&tree.request.id, reviewer_id))
        .collect();
    Ok(CascadePlan { puts, deletes })
}

/// Keys of every item `tree` owns, reviewer associations included
pub fn plan_request_delete(tree: &RequestWithGroupsWithTargets) -> Vec<PrimaryKey> {
    let request_id = &tree.request.id;
    let mut keys_out = vec![PrimaryKey::new(
        keys::REQUEST_PARTITION,
        keys::request_sk(request_id),
    )];
    let mut reviewers = tree.request.reviewer_ids.clone();
    for g in &tree.groups {
        keys_out.push(PrimaryKey::new(
            keys::REQUEST_PARTITION,
            keys::group_sk(request_id, &g.group.id),
        ));
        for t in &g.targets {
            keys_out.push(PrimaryKey::new(
                keys::REQUEST_PARTITION,
                keys::target_sk(request_id, &g.group.id, &t.id),
            ));
        }
        reviewers.extend(g.group.reviewer_ids.iter().cloned());
    }
    keys_out.extend(reviewers.iter().map(|r| reviewer_key(request_id, r)));
    keys_out
}

fn reviewer_key(request_id: &str, reviewer_id: &str) -> PrimaryKey {
    PrimaryKey::new(
        keys::REVIEWER_PARTITION,
        keys::reviewer_sk(request_id, reviewer_id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Index, ATTR_REQUEST_STATUS};
    use accessgov_core::{
        AccessGroup, AccessGroupWithTargets, ApprovalMethod, GroupStatus, GroupTarget, Request,
        RequestStatus, RuleRef, TargetKind, Timing,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn tree() -> RequestWithGroupsWithTargets {
        let now = Utc.with_ymd_and_hms(2022, 1, 1, 10, 0, 0).unwrap();
        let request = Request::new(
            "r1".to_string(),
            "alice".to_string(),
            RuleRef {
                id: "rule-1".to_string(),
                version: "1".to_string(),
            },
            Timing::asap(Duration::minutes(5)),
            ApprovalMethod::Reviewed,
            now,
        );
        let group = AccessGroup {
            id: "g1".to_string(),
            request_id: "r1".to_string(),
            status: GroupStatus::Pending,
            request_status: RequestStatus::Pending,
            request_reviewer_ids: BTreeSet::new(),
            timing: Timing::asap(Duration::minutes(5)),
            override_timing: None,
            reviewer_ids: ["bob".to_string()].into(),
            created_at: now,
            updated_at: now,
        };
        let target = GroupTarget {
            id: "t1".to_string(),
            group_id: "g1".to_string(),
            request_id: "r1".to_string(),
            target_cache_id: "cache-1".to_string(),
            target_kind: TargetKind::new("acme", "aws", "Account"),
            fields: Vec::new(),
            request_status: RequestStatus::Pending,
            request_reviewer_ids: BTreeSet::new(),
            grant: None,
            created_at: now,
            updated_at: now,
        };
        RequestWithGroupsWithTargets {
            request,
            groups: vec![AccessGroupWithTargets {
                group,
                targets: vec![target],
            }],
        }
    }

    #[test]
    fn test_plan_covers_every_item_with_synced_copies() {
        let mut t = tree();
        t.request.status = RequestStatus::Approved;

        let items = plan_request_items(&t).unwrap();

        // request, group, target, reviewer bob
        assert_eq!(items.len(), 4);
        for item in &items {
            assert_eq!(
                item.attribute(ATTR_REQUEST_STATUS),
                Some(&serde_json::json!("APPROVED")),
                "{}",
                item.key.sk
            );
            assert_eq!(
                item.partition_key_for(Some(Index::Gsi2)).map(|p| p.ends_with("APPROVED")),
                Some(true)
            );
        }
        let request: Request = items[0].decode().unwrap();
        assert_eq!(request.group_target_count, 1);
    }

    #[test]
    fn test_update_drops_removed_reviewers() {
        let mut t = tree();
        t.sync_denormalized();
        let previous: BTreeSet<String> = ["bob".to_string(), "carol".to_string()].into();

        let plan = plan_request_update(&t, &previous).unwrap();

        assert_eq!(
            plan.deletes,
            vec![PrimaryKey::new("REVIEWER#", "REQUEST#r1#REVIEWER#carol#")]
        );
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_delete_lists_all_keys() {
        let keys = plan_request_delete(&tree());
        let sks: Vec<&str> = keys.iter().map(|k| k.sk.as_str()).collect();
        assert_eq!(
            sks,
            vec![
                "REQUEST#r1#",
                "REQUEST#r1#GROUP#g1#",
                "REQUEST#r1#GROUP#g1#TARGET#t1#",
                "REQUEST#r1#REVIEWER#bob#",
            ]
        );
    }
}
