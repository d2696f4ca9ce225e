//! Access request root entity

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::grant::Grant;
use super::timing::{resolve_interval, Interval, Timing};
use crate::ordering::derived_end_time;

/// Lifecycle status of an access request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Declined => "DECLINED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }

    /// Declined and cancelled requests never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Declined | RequestStatus::Cancelled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the request gets (or got) approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalMethod {
    Automatic,
    Reviewed,
}

/// Reference to the access rule a request was made against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRef {
    pub id: String,
    pub version: String,
}

/// An access request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub requested_by: String,
    pub rule: RuleRef,
    pub requested_timing: Timing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_timing: Option<Timing>,
    pub status: RequestStatus,
    pub approval_method: ApprovalMethod,
    /// Union of every group's reviewers
    #[serde(default)]
    pub reviewer_ids: BTreeSet<String>,
    /// Number of group targets stored under this request
    pub group_target_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant: Option<Grant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    /// Create a pending request with no groups yet
    pub fn new(
        id: String,
        requested_by: String,
        rule: RuleRef,
        requested_timing: Timing,
        approval_method: ApprovalMethod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            requested_by,
            rule,
            requested_timing,
            override_timing: None,
            status: RequestStatus::Pending,
            approval_method,
            reviewer_ids: BTreeSet::new(),
            group_target_count: 0,
            grant: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Effective access window, override first
    pub fn interval(&self, now: DateTime<Utc>) -> Interval {
        resolve_interval(&self.requested_timing, self.override_timing.as_ref(), now)
    }

    /// Timestamp used for every time-ordered index key of this request
    pub fn end_time(&self) -> DateTime<Utc> {
        derived_end_time(
            self.status,
            self.grant.as_ref(),
            &self.requested_timing,
            self.override_timing.as_ref(),
            self.created_at,
        )
    }
}
