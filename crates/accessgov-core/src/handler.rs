//! Access-handler interface
//!
//! The access handler is the collaborator that actually provisions and
//! revokes access in a target system. The engine only persists the `Grant`
//! values it returns.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::model::Grant;

/// Everything the handler needs to provision one grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantSpec {
    pub id: String,
    pub provider: String,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub parameters: BTreeMap<String, serde_json::Value>,
}

/// Provision, revoke and pre-validate grants against a target system.
pub trait AccessHandler: Send + Sync {
    /// Provision a grant.
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` when the handler cannot be reached or fails.
    fn create_grant(&self, spec: &GrantSpec) -> Result<Grant>;

    /// Revoke a previously created grant, returning its new state.
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` when the handler cannot be reached or fails.
    fn revoke_grant(&self, grant: &Grant, revoker_id: &str) -> Result<Grant>;

    /// Dry-run the provider's checks for a grant.
    ///
    /// # Errors
    ///
    /// Returns `GrantValidationFailed` with a human-readable reason when the
    /// provider would reject the grant.
    fn validate_grant(&self, spec: &GrantSpec) -> Result<()>;
}
