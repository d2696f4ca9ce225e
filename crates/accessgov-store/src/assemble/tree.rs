//! Single-tree assembly

use std::collections::BTreeMap;

use accessgov_core::errors::AccessError;
use accessgov_core::{
    AccessGroup, AccessGroupWithTargets, GroupTarget, Request, RequestWithGroupsWithTargets,
};

use crate::errors::Result;
use crate::item::RawItem;
use crate::keys::{classify_sort_key, ItemKind};

/// Accumulates the items of one request in any order.
///
/// Groups and targets are keyed by id, and ids sort the same way their sort
/// keys do, so the finished tree is in ascending sort-key order whatever
/// order the items arrived in.
#[derive(Default)]
pub(crate) struct TreeBuilder {
    request_id: Option<String>,
    request: Option<Request>,
    groups: BTreeMap<String, AccessGroup>,
    targets: BTreeMap<String, BTreeMap<String, GroupTarget>>,
    /// Sort key of the first target seen per group, for orphan reports
    target_keys: BTreeMap<String, String>,
}

impl TreeBuilder {
    pub(crate) fn push(&mut self, item: &RawItem) -> Result<()> {
        let kind = classify_sort_key(&item.key.sk)?;
        match &self.request_id {
            Some(id) if id != kind.request_id() => {
                return Err(AccessError::OrphanItem {
                    sort_key: item.key.sk.clone(),
                }
                .into());
            }
            Some(_) => {}
            None => self.request_id = Some(kind.request_id().to_string()),
        }

        match kind {
            ItemKind::Request { .. } => self.request = Some(item.decode()?),
            ItemKind::Group { group_id, .. } => {
                self.groups.insert(group_id, item.decode()?);
            }
            ItemKind::Target {
                group_id,
                target_id,
                ..
            } => {
                self.target_keys
                    .entry(group_id.clone())
                    .or_insert_with(|| item.key.sk.clone());
                self.targets
                    .entry(group_id)
                    .or_default()
                    .insert(target_id, item.decode()?);
            }
            ItemKind::Reviewer { .. } => {
                return Err(AccessError::UnrecognisedSortKey {
                    sort_key: item.key.sk.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Result<RequestWithGroupsWithTargets> {
        let Some(request_id) = self.request_id else {
            return Err(AccessError::NoItems.into());
        };
        let request = self.request.ok_or_else(|| AccessError::OrphanItem {
            sort_key: crate::keys::request_sk(&request_id),
        })?;

        if let Some(orphan) = self.targets.keys().find(|g| !self.groups.contains_key(*g)) {
            return Err(AccessError::OrphanItem {
                sort_key: self.target_keys.remove(orphan).unwrap_or_default(),
            }
            .into());
        }

        let groups = self
            .groups
            .into_iter()
            .map(|(id, group)| AccessGroupWithTargets {
                group,
                targets: self
                    .targets
                    .remove(&id)
                    .map(|t| t.into_values().collect())
                    .unwrap_or_default(),
            })
            .collect();

        Ok(RequestWithGroupsWithTargets { request, groups })
    }
}

/// Assemble one tree from items in ascending sort-key order.
///
/// # Errors
///
/// `NoItems` for an empty slice; `OrphanItem` if the first item is not the
/// request, a target has no group, or the slice mixes requests.
pub fn assemble_forward(items: &[RawItem]) -> Result<RequestWithGroupsWithTargets> {
    expect_request_at(items.first())?;
    let mut builder = TreeBuilder::default();
    for item in items {
        builder.push(item)?;
    }
    builder.finish()
}

/// Assemble one tree from items in descending sort-key order.
///
/// Targets arrive before their group and the request arrives last.
///
/// # Errors
///
/// As [`assemble_forward`], with the request expected as the last item.
pub fn assemble_reverse(items: &[RawItem]) -> Result<RequestWithGroupsWithTargets> {
    expect_request_at(items.last())?;
    let mut builder = TreeBuilder::default();
    for item in items {
        builder.push(item)?;
    }
    builder.finish()
}

fn expect_request_at(item: Option<&RawItem>) -> Result<()> {
    let item = item.ok_or(AccessError::NoItems)?;
    match classify_sort_key(&item.key.sk)? {
        ItemKind::Request { .. } => Ok(()),
        _ => Err(AccessError::OrphanItem {
            sort_key: item.key.sk.clone(),
        }
        .into()),
    }
}
