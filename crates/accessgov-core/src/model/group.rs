use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::RequestStatus;
use super::timing::{resolve_interval, Interval, Timing};

/// Per-group review outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    Pending,
    Approved,
    Declined,
}

/// An access group inside a request
///
/// `request_status` and `request_reviewer_ids` are copies of the parent's
/// values, rewritten on every change to the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessGroup {
    pub id: String,
    pub request_id: String,
    pub status: GroupStatus,
    pub request_status: RequestStatus,
    #[serde(default)]
    pub request_reviewer_ids: BTreeSet<String>,
    pub timing: Timing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_timing: Option<Timing>,
    #[serde(default)]
    pub reviewer_ids: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessGroup {
    pub fn interval(&self, now: DateTime<Utc>) -> Interval {
        resolve_interval(&self.timing, self.override_timing.as_ref(), now)
    }
}
