//! Reviewer association access patterns
//!
//! Each association holds its own copy of the request, so these are flat
//! lists with no tree assembly.

use accessgov_core::errors::AccessError;
use accessgov_core::{RequestStatus, Reviewer};
use chrono::{DateTime, Utc};

use crate::cursor::Cursor;
use crate::errors::Result;
use crate::item::Index;
use crate::keys::{self, validate_id};
use crate::query::{QueryInput, QueryPage, SortKeyCondition};

use super::{AccessPattern, QueryUnmarshal};

fn decode_reviewers(out: &mut Vec<Reviewer>, page: QueryPage) -> Result<Option<Cursor>> {
    for item in &page.items {
        out.push(item.decode()?);
    }
    Ok(page.last_evaluated)
}

/// One reviewer's association with one request
#[derive(Debug, Clone, Default)]
pub struct GetRequestReviewer {
    pub request_id: String,
    pub reviewer_id: String,
    pub result: Option<Reviewer>,
}

impl GetRequestReviewer {
    pub fn new(request_id: impl Into<String>, reviewer_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            reviewer_id: reviewer_id.into(),
            result: None,
        }
    }
}

impl AccessPattern for GetRequestReviewer {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.request_id)?;
        validate_id(&self.reviewer_id)?;
        Ok(QueryInput::main(keys::REVIEWER_PARTITION).with_sort_key(
            SortKeyCondition::Equals(keys::reviewer_sk(&self.request_id, &self.reviewer_id)),
        ))
    }
}

impl QueryUnmarshal for GetRequestReviewer {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        let Some(item) = page.items.first() else {
            return Err(AccessError::ReviewerNotFound {
                request_id: self.request_id.clone(),
                reviewer_id: self.reviewer_id.clone(),
            }
            .into());
        };
        self.result = Some(item.decode()?);
        Ok(None)
    }
}

/// Every reviewer of one request, ascending by reviewer id
#[derive(Debug, Clone, Default)]
pub struct ListRequestReviewers {
    pub request_id: String,
    pub reviewers: Vec<Reviewer>,
}

impl ListRequestReviewers {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            reviewers: Vec::new(),
        }
    }
}

impl AccessPattern for ListRequestReviewers {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.request_id)?;
        Ok(QueryInput::main(keys::REVIEWER_PARTITION)
            .with_sort_key(SortKeyCondition::BeginsWith(keys::request_sk(&self.request_id))))
    }
}

impl QueryUnmarshal for ListRequestReviewers {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        decode_reviewers(&mut self.reviewers, page)
    }
}

/// Requests a reviewer is on, latest end time first
#[derive(Debug, Clone, Default)]
pub struct ListReviewerRequests {
    pub reviewer_id: String,
    pub reviewers: Vec<Reviewer>,
}

impl ListReviewerRequests {
    pub fn new(reviewer_id: impl Into<String>) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            reviewers: Vec::new(),
        }
    }
}

impl AccessPattern for ListReviewerRequests {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.reviewer_id)?;
        Ok(
            QueryInput::on_index(Index::Gsi1, keys::reviewer_partition(&self.reviewer_id))
                .reverse(),
        )
    }
}

impl QueryUnmarshal for ListReviewerRequests {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        decode_reviewers(&mut self.reviewers, page)
    }
}

/// Requests in one status that a reviewer is on, ascending by request id
#[derive(Debug, Clone)]
pub struct ListReviewerRequestsForStatus {
    pub reviewer_id: String,
    pub status: RequestStatus,
    pub reviewers: Vec<Reviewer>,
}

impl ListReviewerRequestsForStatus {
    pub fn new(reviewer_id: impl Into<String>, status: RequestStatus) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            status,
            reviewers: Vec::new(),
        }
    }
}

impl AccessPattern for ListReviewerRequestsForStatus {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.reviewer_id)?;
        Ok(QueryInput::on_index(
            Index::Gsi2,
            keys::reviewer_status_partition(&self.reviewer_id, self.status),
        ))
    }
}

impl QueryUnmarshal for ListReviewerRequestsForStatus {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        decode_reviewers(&mut self.reviewers, page)
    }
}

/// Requests a reviewer is on that end after `now`, soonest first
#[derive(Debug, Clone)]
pub struct ListUpcomingReviewerRequests {
    pub reviewer_id: String,
    pub now: DateTime<Utc>,
    pub reviewers: Vec<Reviewer>,
}

impl ListUpcomingReviewerRequests {
    pub fn new(reviewer_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            now,
            reviewers: Vec::new(),
        }
    }
}

impl AccessPattern for ListUpcomingReviewerRequests {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.reviewer_id)?;
        Ok(
            QueryInput::on_index(Index::Gsi1, keys::reviewer_partition(&self.reviewer_id))
                .with_sort_key(SortKeyCondition::GreaterOrEqual(keys::upcoming_boundary(
                    self.now,
                ))),
        )
    }
}

impl QueryUnmarshal for ListUpcomingReviewerRequests {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        decode_reviewers(&mut self.reviewers, page)
    }
}

/// Requests a reviewer is on that ended at or before `now`, most recent first
#[derive(Debug, Clone)]
pub struct ListPastReviewerRequests {
    pub reviewer_id: String,
    pub now: DateTime<Utc>,
    pub reviewers: Vec<Reviewer>,
}

impl ListPastReviewerRequests {
    pub fn new(reviewer_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            now,
            reviewers: Vec::new(),
        }
    }
}

impl AccessPattern for ListPastReviewerRequests {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.reviewer_id)?;
        Ok(
            QueryInput::on_index(Index::Gsi1, keys::reviewer_partition(&self.reviewer_id))
                .with_sort_key(SortKeyCondition::LessThan(keys::upcoming_boundary(self.now)))
                .reverse(),
        )
    }
}

impl QueryUnmarshal for ListPastReviewerRequests {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        decode_reviewers(&mut self.reviewers, page)
    }
}
