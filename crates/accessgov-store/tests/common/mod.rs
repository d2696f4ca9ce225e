use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use accessgov_core::{
    AccessGroup, AccessGroupWithTargets, ApprovalMethod, ExError, ExErrorKind, GroupStatus,
    GroupTarget, Request, RequestStatus, RequestWithGroupsWithTargets, RuleRef, TargetKind,
    Timing,
};
use accessgov_store::{
    plan_request_items, BatchWriter, Cursor, ItemStore, PrimaryKey, QueryInput, QueryPage,
    RawItem,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// 2022-01-01 at `h:m` UTC
#[allow(dead_code)]
pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 1, 1, h, m, 0).unwrap()
}

/// A pending tree for `user` whose group `i` has `shape[i]` targets.
///
/// Timing is scheduled to start at `start` for one hour, so the derived end
/// time is `start + 1h`.
#[allow(dead_code)]
pub fn tree_for(
    id: &str,
    user: &str,
    start: DateTime<Utc>,
    shape: &[usize],
) -> RequestWithGroupsWithTargets {
    let timing = Timing::scheduled(start, Duration::hours(1));
    let request = Request::new(
        id.to_string(),
        user.to_string(),
        RuleRef {
            id: "rule-1".to_string(),
            version: "v1".to_string(),
        },
        timing,
        ApprovalMethod::Reviewed,
        at(9, 0),
    );
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
                    timing,
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

/// `tree_for` with user alice starting at 10:00
#[allow(dead_code)]
pub fn tree(id: &str, shape: &[usize]) -> RequestWithGroupsWithTargets {
    tree_for(id, "alice", at(10, 0), shape)
}

/// Persist every item of `tree`
#[allow(dead_code)]
pub fn write_tree(store: &dyn ItemStore, tree: &RequestWithGroupsWithTargets) {
    let items = plan_request_items(tree).unwrap();
    BatchWriter::new(store).put_all(items).unwrap();
}

/// Main-table items of `tree` in ascending sort-key order, reviewers excluded
#[allow(dead_code)]
pub fn tree_items(tree: &RequestWithGroupsWithTargets) -> Vec<RawItem> {
    let mut items: Vec<RawItem> = plan_request_items(tree)
        .unwrap()
        .into_iter()
        .filter(|i| i.key.pk == accessgov_store::keys::REQUEST_PARTITION)
        .collect();
    items.sort_by(|a, b| a.key.sk.cmp(&b.key.sk));
    items
}

/// Store wrapper whose batch writes start failing after `ok_batches` calls
#[allow(dead_code)]
pub struct FlakyStore<S> {
    pub inner: S,
    ok_batches: usize,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl<S: ItemStore> FlakyStore<S> {
    pub fn new(inner: S, ok_batches: usize) -> Self {
        Self {
            inner,
            ok_batches,
            calls: AtomicUsize::new(0),
        }
    }

    fn check(&self) -> accessgov_store::Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.ok_batches {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("flaky")
                .with_message("throttled"));
        }
        Ok(())
    }
}

impl<S: ItemStore> ItemStore for FlakyStore<S> {
    fn max_batch_items(&self) -> usize {
        self.inner.max_batch_items()
    }

    fn put(&self, item: RawItem) -> accessgov_store::Result<()> {
        self.inner.put(item)
    }

    fn put_batch(&self, items: Vec<RawItem>) -> accessgov_store::Result<()> {
        self.check()?;
        self.inner.put_batch(items)
    }

    fn delete_batch(&self, keys: Vec<PrimaryKey>) -> accessgov_store::Result<()> {
        self.check()?;
        self.inner.delete_batch(keys)
    }

    fn query(
        &self,
        input: &QueryInput,
        start: Option<&Cursor>,
    ) -> accessgov_store::Result<QueryPage> {
        self.inner.query(input, start)
    }
}
