//! Grant value embedded on requests and group targets

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AccessError, Result};

/// Provisioning status reported by the access handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantStatus {
    Pending,
    Active,
    Revoked,
    Expired,
    Error,
}

impl GrantStatus {
    /// Revoked and errored grants no longer describe a real access window
    pub fn is_usable(self) -> bool {
        !matches!(self, GrantStatus::Revoked | GrantStatus::Error)
    }

    /// Statuses a revoke may be issued against
    pub fn is_revocable(self) -> bool {
        matches!(self, GrantStatus::Active | GrantStatus::Pending)
    }
}

/// A provisioned (or provisioning) grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    /// Provider reference the grant was issued against
    pub provider: String,
    /// Identity receiving access
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: GrantStatus,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<String>,
}

impl Grant {
    pub fn is_usable(&self) -> bool {
        self.status.is_usable()
    }

    /// Revoke guard.
    ///
    /// A grant may be revoked while it is ACTIVE or PENDING and its end
    /// instant is still in the future.
    ///
    /// # Errors
    ///
    /// Returns `InactiveGrant` otherwise.
    pub fn ensure_revocable(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.status.is_revocable() {
            return Err(AccessError::InactiveGrant {
                subject: self.subject.clone(),
                status: self.status,
                reason: "only active or pending grants can be revoked".to_string(),
            });
        }
        if self.end <= now {
            return Err(AccessError::InactiveGrant {
                subject: self.subject.clone(),
                status: self.status,
                reason: format!("grant ended at {}", self.end.to_rfc3339()),
            });
        }
        Ok(())
    }
}
