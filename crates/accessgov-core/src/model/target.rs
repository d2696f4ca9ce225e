use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::grant::Grant;
use super::request::RequestStatus;

/// Provider reference of a target: which integration resolves and grants it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetKind {
    pub publisher: String,
    pub name: String,
    pub kind: String,
}

impl TargetKind {
    pub fn new(
        publisher: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            publisher: publisher.into(),
            name: name.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.publisher, self.name, self.kind)
    }
}

/// A value the requester picked for one of the target's fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetField {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub value: String,
}

/// One concrete target inside an access group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTarget {
    pub id: String,
    pub group_id: String,
    pub request_id: String,
    /// Cached target this was selected from; the cache entry may since be gone
    pub target_cache_id: String,
    pub target_kind: TargetKind,
    #[serde(default)]
    pub fields: Vec<TargetField>,
    pub request_status: RequestStatus,
    #[serde(default)]
    pub request_reviewer_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant: Option<Grant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupTarget {
    /// Field values keyed by field id, as handed to the access handler
    pub fn parameters(&self) -> BTreeMap<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|f| (f.id.clone(), serde_json::Value::String(f.value.clone())))
            .collect()
    }
}
