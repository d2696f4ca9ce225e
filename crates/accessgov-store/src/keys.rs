//! Key codec
//!
//! Pure functions from entity identifiers to partition keys, sort keys and
//! secondary-index keys. Nothing here touches a store.
//!
//! Identifiers are restricted to `[A-Za-z0-9_.:@-]`. Every one of those
//! bytes sorts above the `#` delimiter, so all sort keys of one request form
//! a contiguous range even when another request id extends it (`r1` vs
//! `r10`).

use accessgov_core::errors::AccessError;
use accessgov_core::{Request, RequestStatus};
use chrono::{DateTime, Duration, Utc};

use crate::item::{IndexKey, IndexKeys};

pub const DELIMITER: char = '#';

/// Main-table partition shared by every request tree item
pub const REQUEST_PARTITION: &str = "ACCESS_REQUEST#";
/// Main-table partition of reviewer associations
pub const REVIEWER_PARTITION: &str = "REVIEWER#";

const REQUEST_TAG: &str = "REQUEST";
const GROUP_TAG: &str = "GROUP";
const TARGET_TAG: &str = "TARGET";
const REVIEWER_TAG: &str = "REVIEWER";

/// Width of an encoded instant
pub const INSTANT_WIDTH: usize = 20;

const SIGN_BIT: u64 = 1 << 63;

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'@' | b'-')
}

/// Check an identifier before it is embedded in a key.
///
/// # Errors
///
/// Returns `InvalidIdentifier` for empty ids or ids containing anything
/// outside `[A-Za-z0-9_.:@-]`.
pub fn validate_id(id: &str) -> Result<(), AccessError> {
    if id.is_empty() {
        return Err(AccessError::InvalidIdentifier {
            id: id.to_string(),
            reason: "identifier is empty".to_string(),
        });
    }
    if let Some(bad) = id.bytes().find(|b| !is_id_byte(*b)) {
        return Err(AccessError::InvalidIdentifier {
            id: id.to_string(),
            reason: format!("character {:?} is not allowed", bad as char),
        });
    }
    Ok(())
}

pub fn request_sk(request_id: &str) -> String {
    format!("{REQUEST_TAG}#{request_id}#")
}

pub fn group_sk(request_id: &str, group_id: &str) -> String {
    format!("{REQUEST_TAG}#{request_id}#{GROUP_TAG}#{group_id}#")
}

pub fn target_sk(request_id: &str, group_id: &str, target_id: &str) -> String {
    format!("{REQUEST_TAG}#{request_id}#{GROUP_TAG}#{group_id}#{TARGET_TAG}#{target_id}#")
}

pub fn reviewer_sk(request_id: &str, reviewer_id: &str) -> String {
    format!("{REQUEST_TAG}#{request_id}#{REVIEWER_TAG}#{reviewer_id}#")
}

/// Order-preserving fixed-width encoding of an instant.
///
/// The signed millisecond timestamp has its sign bit flipped so negative
/// instants sort before positive ones, then is zero-padded to
/// [`INSTANT_WIDTH`] digits.
pub fn encode_instant(instant: DateTime<Utc>) -> String {
    let millis = instant.timestamp_millis();
    format!("{:0width$}", (millis as u64) ^ SIGN_BIT, width = INSTANT_WIDTH)
}

pub fn decode_instant(encoded: &str) -> Option<DateTime<Utc>> {
    if encoded.len() != INSTANT_WIDTH {
        return None;
    }
    let raw: u64 = encoded.parse().ok()?;
    DateTime::from_timestamp_millis((raw ^ SIGN_BIT) as i64)
}

/// Index sort key `{end}#{sk}`
pub fn time_prefixed(end: DateTime<Utc>, sk: &str) -> String {
    format!("{}{DELIMITER}{}", encode_instant(end), sk)
}

/// Smallest encoded prefix of any item that is upcoming at `now`.
///
/// Upcoming is `end > now`; keys carry millisecond precision, so the
/// boundary is the next millisecond.
pub fn upcoming_boundary(now: DateTime<Utc>) -> String {
    let next = now
        .checked_add_signed(Duration::milliseconds(1))
        .unwrap_or(now);
    encode_instant(next)
}

pub fn user_partition(user_id: &str) -> String {
    format!("USER#{user_id}")
}

pub fn status_partition(status: RequestStatus) -> String {
    format!("STATUS#{status}")
}

pub fn rule_partition(rule_id: &str) -> String {
    format!("RULE#{rule_id}")
}

pub fn reviewer_partition(reviewer_id: &str) -> String {
    format!("{REVIEWER_TAG}#{reviewer_id}")
}

pub fn reviewer_status_partition(reviewer_id: &str, status: RequestStatus) -> String {
    format!("{REVIEWER_TAG}#{reviewer_id}#STATUS#{status}")
}

/// Index keys shared by every item of a request tree.
///
/// `sk` is the item's own main-table sort key. The end instant comes from the
/// request's derived end time, so a status or grant change moves the whole
/// tree together.
pub fn tree_index_keys(request: &Request, sk: &str) -> IndexKeys {
    let end = request.end_time();
    IndexKeys {
        gsi1: Some(IndexKey::new(
            user_partition(&request.requested_by),
            time_prefixed(end, sk),
        )),
        gsi2: Some(IndexKey::new(status_partition(request.status), sk)),
        gsi3: Some(IndexKey::new(rule_partition(&request.rule.id), sk)),
        gsi4: Some(IndexKey::new(REQUEST_PARTITION, time_prefixed(end, sk))),
    }
}

/// Index keys of one reviewer association
pub fn reviewer_index_keys(reviewer_id: &str, request: &Request, sk: &str) -> IndexKeys {
    IndexKeys {
        gsi1: Some(IndexKey::new(
            reviewer_partition(reviewer_id),
            time_prefixed(request.end_time(), sk),
        )),
        gsi2: Some(IndexKey::new(
            reviewer_status_partition(reviewer_id, request.status),
            sk,
        )),
        gsi3: None,
        gsi4: None,
    }
}

/// What a sort key identifies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Request {
        request_id: String,
    },
    Group {
        request_id: String,
        group_id: String,
    },
    Target {
        request_id: String,
        group_id: String,
        target_id: String,
    },
    Reviewer {
        request_id: String,
        reviewer_id: String,
    },
}

impl ItemKind {
    pub fn request_id(&self) -> &str {
        match self {
            ItemKind::Request { request_id }
            | ItemKind::Group { request_id, .. }
            | ItemKind::Target { request_id, .. }
            | ItemKind::Reviewer { request_id, .. } => request_id,
        }
    }
}

/// Parse a sort key back into its kind and ids.
///
/// Accepts main-table sort keys and index sort keys with a leading encoded
/// instant.
///
/// # Errors
///
/// Returns `UnrecognisedSortKey` when the key does not follow the layout.
pub fn classify_sort_key(sort_key: &str) -> Result<ItemKind, AccessError> {
    let unrecognised = || AccessError::UnrecognisedSortKey {
        sort_key: sort_key.to_string(),
    };

    let key = match sort_key.split_once(DELIMITER) {
        Some((prefix, rest))
            if prefix.len() == INSTANT_WIDTH && prefix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => sort_key,
    };

    let body = key.strip_suffix(DELIMITER).ok_or_else(unrecognised)?;
    let segments: Vec<&str> = body.split(DELIMITER).collect();
    if segments.iter().skip(1).step_by(2).any(|id| id.is_empty()) {
        return Err(unrecognised());
    }

    match segments.as_slice() {
        [REQUEST_TAG, rid] => Ok(ItemKind::Request {
            request_id: rid.to_string(),
        }),
        [REQUEST_TAG, rid, GROUP_TAG, gid] => Ok(ItemKind::Group {
            request_id: rid.to_string(),
            group_id: gid.to_string(),
        }),
        [REQUEST_TAG, rid, GROUP_TAG, gid, TARGET_TAG, tid] => Ok(ItemKind::Target {
            request_id: rid.to_string(),
            group_id: gid.to_string(),
            target_id: tid.to_string(),
        }),
        [REQUEST_TAG, rid, REVIEWER_TAG, uid] => Ok(ItemKind::Reviewer {
            request_id: rid.to_string(),
            reviewer_id: uid.to_string(),
        }),
        _ => Err(unrecognised()),
    }
}
