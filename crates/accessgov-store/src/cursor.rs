//! Continuation cursors
//!
//! A cursor is the key of the last item a page covered: its primary key plus,
//! for index queries, its key in the queried index. Callers see it as an
//! opaque URL-safe string.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::errors::{invalid_cursor, serialization_error, Result};
use crate::item::{Index, IndexKey, PrimaryKey, RawItem};

/// Exclusive start position for the next page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub key: PrimaryKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_key: Option<IndexKey>,
}

impl Cursor {
    /// Cursor positioned on `item` for a scan of `index`
    pub fn after(item: &RawItem, index: Option<Index>) -> Self {
        Self {
            key: item.key.clone(),
            index_key: index.and_then(|idx| item.indexes.get(idx).cloned()),
        }
    }

    /// Sort key the cursor sits on within `index`
    pub fn sort_key_for(&self, index: Option<Index>) -> &str {
        match (index, &self.index_key) {
            (Some(_), Some(k)) => &k.sk,
            _ => &self.key.sk,
        }
    }

    /// `(index sort key, pk, sk)`: the total order every backend scans in
    pub fn position(&self, index: Option<Index>) -> (&str, &str, &str) {
        (self.sort_key_for(index), &self.key.pk, &self.key.sk)
    }

    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self).map_err(|e| serialization_error("cursor_encode", e))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// # Errors
    ///
    /// Returns `InvalidCursor` if `s` is not a cursor produced by
    /// [`Cursor::encode`].
    pub fn decode(s: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|_| invalid_cursor("base64 decode failed"))?;
        serde_json::from_slice(&bytes).map_err(|_| invalid_cursor("wrong format"))
    }
}

/// Scan position of an item, comparable with [`Cursor::position`]
pub(crate) fn item_position(item: &RawItem, index: Option<Index>) -> (&str, &str, &str) {
    (
        item.sort_key_for(index).unwrap_or_default(),
        &item.key.pk,
        &item.key.sk,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgov_core::ExErrorKind;

    fn cursor() -> Cursor {
        Cursor {
            key: PrimaryKey::new("ACCESS_REQUEST#", "REQUEST#r1#GROUP#g1#TARGET#t1#"),
            index_key: Some(IndexKey::new("USER#alice", "09223373678211200000#REQUEST#r1#")),
        }
    }

    #[test]
    fn test_cursor_encoding_is_url_safe() {
        let encoded = cursor().encode().unwrap();
        assert!(encoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
        assert_eq!(Cursor::decode(&encoded).unwrap(), cursor());
    }

    #[test]
    fn test_cursor_invalid() {
        for bad in ["not base64 !", "aGVsbG8", ""] {
            let err = Cursor::decode(bad).unwrap_err();
            assert_eq!(err.kind(), ExErrorKind::InvalidCursor, "{bad:?}");
        }
    }

    #[test]
    fn test_position_uses_index_sort_key() {
        let c = cursor();
        assert_eq!(c.position(Some(Index::Gsi1)).0, "09223373678211200000#REQUEST#r1#");
        assert_eq!(c.position(None).0, "REQUEST#r1#GROUP#g1#TARGET#t1#");
    }
}
