//! Assembled request hierarchy
//!
//! `RequestWithGroupsWithTargets` is what the store hands back after
//! reassembling flat items, and what the engine mutates before computing the
//! cascade of items to rewrite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::grant::{Grant, GrantStatus};
use super::group::{AccessGroup, GroupStatus};
use super::request::{Request, RequestStatus};
use super::reviewer::Reviewer;
use super::target::GroupTarget;
use crate::errors::{AccessError, Result};

/// An access group with its targets, in sort-key order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessGroupWithTargets {
    pub group: AccessGroup,
    pub targets: Vec<GroupTarget>,
}

/// A request with its groups and their targets, in sort-key order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestWithGroupsWithTargets {
    pub request: Request,
    pub groups: Vec<AccessGroupWithTargets>,
}

impl RequestWithGroupsWithTargets {
    pub fn target_count(&self) -> usize {
        self.groups.iter().map(|g| g.targets.len()).sum()
    }

    pub fn targets(&self) -> impl Iterator<Item = &GroupTarget> {
        self.groups.iter().flat_map(|g| g.targets.iter())
    }

    pub fn targets_mut(&mut self) -> impl Iterator<Item = &mut GroupTarget> {
        self.groups.iter_mut().flat_map(|g| g.targets.iter_mut())
    }

    /// Re-derive every denormalized field from the authoritative request.
    ///
    /// Sets the group-target count, folds group reviewers into the request's
    /// reviewer set, and copies status and reviewers down to each child.
    pub fn sync_denormalized(&mut self) {
        self.request.group_target_count = self.target_count();
        for g in &self.groups {
            self.request
                .reviewer_ids
                .extend(g.group.reviewer_ids.iter().cloned());
        }

        let status = self.request.status;
        let reviewers = self.request.reviewer_ids.clone();
        for g in &mut self.groups {
            g.group.request_status = status;
            g.group.request_reviewer_ids = reviewers.clone();
            for t in &mut g.targets {
                t.request_status = status;
                t.request_reviewer_ids = reviewers.clone();
            }
        }
    }

    /// Move the request to `status`, stamping `now` on every item touched.
    ///
    /// Group statuses follow the request for approve/decline; a cancel leaves
    /// them as they were.
    pub fn set_status(&mut self, status: RequestStatus, now: DateTime<Utc>) {
        self.request.status = status;
        self.request.updated_at = now;
        let group_status = match status {
            RequestStatus::Approved => Some(GroupStatus::Approved),
            RequestStatus::Declined => Some(GroupStatus::Declined),
            RequestStatus::Pending | RequestStatus::Cancelled => None,
        };
        for g in &mut self.groups {
            if let Some(s) = group_status {
                g.group.status = s;
            }
            g.group.updated_at = now;
            for t in &mut g.targets {
                t.updated_at = now;
            }
        }
        self.sync_denormalized();
    }

    /// Look up a target by group and target id
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` or `TargetNotFound`.
    pub fn find_target(&self, group_id: &str, target_id: &str) -> Result<&GroupTarget> {
        let group = self
            .groups
            .iter()
            .find(|g| g.group.id == group_id)
            .ok_or_else(|| AccessError::GroupNotFound {
                request_id: self.request.id.clone(),
                group_id: group_id.to_string(),
            })?;
        group
            .targets
            .iter()
            .find(|t| t.id == target_id)
            .ok_or_else(|| AccessError::TargetNotFound {
                request_id: self.request.id.clone(),
                group_id: group_id.to_string(),
                target_id: target_id.to_string(),
            })
    }

    /// Recompute the request-level grant as the envelope of its target grants.
    ///
    /// The envelope spans the earliest start to the latest end. Its status is
    /// ACTIVE if any target grant is active, then PENDING, ERROR, REVOKED and
    /// finally EXPIRED. Without any target grant the request has no grant.
    pub fn derive_request_grant(&mut self) {
        let grants: Vec<&Grant> = self.targets().filter_map(|t| t.grant.as_ref()).collect();
        let (Some(start), Some(end)) = (
            grants.iter().map(|g| g.start).min(),
            grants.iter().map(|g| g.end).max(),
        ) else {
            self.request.grant = None;
            return;
        };

        let any = |s: GrantStatus| grants.iter().any(|g| g.status == s);
        let status = [
            GrantStatus::Active,
            GrantStatus::Pending,
            GrantStatus::Error,
            GrantStatus::Revoked,
        ]
        .into_iter()
        .find(|s| any(*s))
        .unwrap_or(GrantStatus::Expired);

        let revoked_by = grants.iter().find_map(|g| g.revoked_by.clone());

        self.request.grant = Some(Grant {
            id: self.request.id.clone(),
            provider: self.request.rule.id.clone(),
            subject: self.request.requested_by.clone(),
            start,
            end,
            status,
            parameters: Default::default(),
            revoked_by: if status == GrantStatus::Revoked {
                revoked_by
            } else {
                None
            },
        });
    }

    /// Reviewer associations for the request's current reviewer set
    pub fn reviewers(&self) -> Vec<Reviewer> {
        self.request
            .reviewer_ids
            .iter()
            .map(|id| Reviewer::new(id.clone(), self.request.clone()))
            .collect()
    }
}
