//! Raw store items
//!
//! A `RawItem` is what the key-value store holds: a primary key, up to four
//! secondary-index keys, and a JSON payload. Entities are converted to and
//! from items here; which keys they get is decided by [`crate::keys`].

use std::fmt;

use accessgov_core::{AccessGroup, GroupTarget, Request, Reviewer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{serialization_error, Result};
use crate::keys;

/// Attribute carrying the owning request's status on every item
pub const ATTR_REQUEST_STATUS: &str = "request_status";
/// Attribute carrying the owning request's reviewer set on every item
pub const ATTR_REQUEST_REVIEWER_IDS: &str = "request_reviewer_ids";

/// Secondary indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Index {
    /// By requester (or reviewer) and derived end time
    Gsi1,
    /// By request status
    Gsi2,
    /// By rule
    Gsi3,
    /// All requests by derived end time
    Gsi4,
}

impl Index {
    pub const ALL: [Index; 4] = [Index::Gsi1, Index::Gsi2, Index::Gsi3, Index::Gsi4];

    pub fn as_str(self) -> &'static str {
        match self {
            Index::Gsi1 => "gsi1",
            Index::Gsi2 => "gsi2",
            Index::Gsi3 => "gsi3",
            Index::Gsi4 => "gsi4",
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main-table key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub pk: String,
    pub sk: String,
}

impl PrimaryKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

/// Key of an item within one secondary index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexKey {
    pub pk: String,
    pub sk: String,
}

impl IndexKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKeys {
    pub gsi1: Option<IndexKey>,
    pub gsi2: Option<IndexKey>,
    pub gsi3: Option<IndexKey>,
    pub gsi4: Option<IndexKey>,
}

impl IndexKeys {
    pub fn get(&self, index: Index) -> Option<&IndexKey> {
        match index {
            Index::Gsi1 => self.gsi1.as_ref(),
            Index::Gsi2 => self.gsi2.as_ref(),
            Index::Gsi3 => self.gsi3.as_ref(),
            Index::Gsi4 => self.gsi4.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub key: PrimaryKey,
    pub indexes: IndexKeys,
    pub data: serde_json::Value,
}

impl RawItem {
    /// Sort key this item is ordered by when scanning `index`
    /// (the main-table sort key when `index` is `None`).
    pub fn sort_key_for(&self, index: Option<Index>) -> Option<&str> {
        match index {
            None => Some(self.key.sk.as_str()),
            Some(idx) => self.indexes.get(idx).map(|k| k.sk.as_str()),
        }
    }

    pub fn partition_key_for(&self, index: Option<Index>) -> Option<&str> {
        match index {
            None => Some(self.key.pk.as_str()),
            Some(idx) => self.indexes.get(idx).map(|k| k.pk.as_str()),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.data.get(name)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| serialization_error("item_decode", e))
    }

    pub fn from_request(request: &Request) -> Result<Self> {
        let sk = keys::request_sk(&request.id);
        Ok(Self {
            indexes: keys::tree_index_keys(request, &sk),
            key: PrimaryKey::new(keys::REQUEST_PARTITION, sk),
            data: with_request_attributes(encode(request)?, request),
        })
    }

    /// Encode a group. Index keys follow `request`, the group's parent.
    pub fn from_group(group: &AccessGroup, request: &Request) -> Result<Self> {
        let sk = keys::group_sk(&group.request_id, &group.id);
        Ok(Self {
            indexes: keys::tree_index_keys(request, &sk),
            key: PrimaryKey::new(keys::REQUEST_PARTITION, sk),
            data: encode(group)?,
        })
    }

    pub fn from_target(target: &GroupTarget, request: &Request) -> Result<Self> {
        let sk = keys::target_sk(&target.request_id, &target.group_id, &target.id);
        Ok(Self {
            indexes: keys::tree_index_keys(request, &sk),
            key: PrimaryKey::new(keys::REQUEST_PARTITION, sk),
            data: encode(target)?,
        })
    }

    pub fn from_reviewer(reviewer: &Reviewer) -> Result<Self> {
        let sk = keys::reviewer_sk(&reviewer.request.id, &reviewer.reviewer_id);
        Ok(Self {
            indexes: keys::reviewer_index_keys(&reviewer.reviewer_id, &reviewer.request, &sk),
            key: PrimaryKey::new(keys::REVIEWER_PARTITION, sk),
            data: with_request_attributes(encode(reviewer)?, &reviewer.request),
        })
    }
}

fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| serialization_error("item_encode", e))
}

/// Groups and targets carry the request attributes as fields of their own;
/// requests and reviewers get them added so every item filters the same way.
fn with_request_attributes(mut data: serde_json::Value, request: &Request) -> serde_json::Value {
    if let Some(obj) = data.as_object_mut() {
        obj.insert(
            ATTR_REQUEST_STATUS.to_string(),
            serde_json::Value::String(request.status.as_str().to_string()),
        );
        obj.insert(
            ATTR_REQUEST_REVIEWER_IDS.to_string(),
            serde_json::Value::Array(
                request
                    .reviewer_ids
                    .iter()
                    .cloned()
                    .map(serde_json::Value::String)
                    .collect(),
            ),
        );
    }
    data
}
