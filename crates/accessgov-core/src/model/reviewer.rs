use serde::{Deserialize, Serialize};

use super::request::Request;

/// Reviewer association
///
/// Holds a full copy of the request so reviewer-scoped listings never need
/// a second lookup. The copy is rewritten whenever the request changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reviewer {
    pub reviewer_id: String,
    pub request: Request,
}

impl Reviewer {
    pub fn new(reviewer_id: impl Into<String>, request: Request) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            request,
        }
    }
}
