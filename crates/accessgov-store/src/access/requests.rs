//! Request-tree access patterns

use accessgov_core::errors::AccessError;
use accessgov_core::{RequestStatus, RequestWithGroupsWithTargets};
use chrono::{DateTime, Utc};

use crate::assemble::assemble_forward;
use crate::cursor::Cursor;
use crate::errors::Result;
use crate::item::{Index, RawItem};
use crate::keys::{self, validate_id};
use crate::query::{QueryInput, QueryPage, ScanDirection, SortKeyCondition};

use super::{unmarshal_trees, AccessPattern, QueryUnmarshal};

/// One request with all its groups and targets.
///
/// Items are collected across pages and assembled once the scan ends, so any
/// page size works with [`super::run_all`]. `result` stays `None` until then.
#[derive(Debug, Clone, Default)]
pub struct GetRequestWithGroupsWithTargets {
    pub id: String,
    pub result: Option<RequestWithGroupsWithTargets>,
    items: Vec<RawItem>,
}

impl GetRequestWithGroupsWithTargets {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// The assembled tree
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the query has not run to completion.
    pub fn into_result(self) -> Result<RequestWithGroupsWithTargets> {
        self.result.ok_or_else(|| {
            AccessError::Internal {
                message: format!("request {} was not read to completion", self.id),
            }
            .into()
        })
    }
}

impl AccessPattern for GetRequestWithGroupsWithTargets {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.id)?;
        Ok(QueryInput::main(keys::REQUEST_PARTITION)
            .with_sort_key(SortKeyCondition::BeginsWith(keys::request_sk(&self.id))))
    }
}

impl QueryUnmarshal for GetRequestWithGroupsWithTargets {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        self.items.extend(page.items);
        if page.last_evaluated.is_some() {
            return Ok(page.last_evaluated);
        }
        if self.items.is_empty() {
            return Err(AccessError::RequestNotFound {
                request_id: self.id.clone(),
            }
            .into());
        }
        let items = std::mem::take(&mut self.items);
        self.result = Some(assemble_forward(&items)?);
        Ok(None)
    }
}

/// Every request, ascending by id
#[derive(Debug, Clone, Default)]
pub struct ListRequestsWithGroupsWithTargets {
    pub trees: Vec<RequestWithGroupsWithTargets>,
}

impl ListRequestsWithGroupsWithTargets {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccessPattern for ListRequestsWithGroupsWithTargets {
    fn build_query(&self) -> Result<QueryInput> {
        Ok(QueryInput::main(keys::REQUEST_PARTITION))
    }
}

impl QueryUnmarshal for ListRequestsWithGroupsWithTargets {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        unmarshal_trees(&mut self.trees, page, ScanDirection::Forward, None)
    }
}

/// A user's requests, latest end time first
#[derive(Debug, Clone, Default)]
pub struct ListRequestsForUser {
    pub user_id: String,
    pub trees: Vec<RequestWithGroupsWithTargets>,
}

impl ListRequestsForUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            trees: Vec::new(),
        }
    }
}

impl AccessPattern for ListRequestsForUser {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.user_id)?;
        Ok(QueryInput::on_index(Index::Gsi1, keys::user_partition(&self.user_id)).reverse())
    }
}

impl QueryUnmarshal for ListRequestsForUser {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        unmarshal_trees(&mut self.trees, page, ScanDirection::Reverse, Some(Index::Gsi1))
    }
}

/// A user's requests ending after `now`, soonest first
#[derive(Debug, Clone)]
pub struct ListUpcomingRequestsForUser {
    pub user_id: String,
    pub now: DateTime<Utc>,
    pub trees: Vec<RequestWithGroupsWithTargets>,
}

impl ListUpcomingRequestsForUser {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            now,
            trees: Vec::new(),
        }
    }
}

impl AccessPattern for ListUpcomingRequestsForUser {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.user_id)?;
        Ok(
            QueryInput::on_index(Index::Gsi1, keys::user_partition(&self.user_id)).with_sort_key(
                SortKeyCondition::GreaterOrEqual(keys::upcoming_boundary(self.now)),
            ),
        )
    }
}

impl QueryUnmarshal for ListUpcomingRequestsForUser {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        unmarshal_trees(&mut self.trees, page, ScanDirection::Forward, Some(Index::Gsi1))
    }
}

/// A user's requests that ended at or before `now`, most recent first
#[derive(Debug, Clone)]
pub struct ListPastRequestsForUser {
    pub user_id: String,
    pub now: DateTime<Utc>,
    pub trees: Vec<RequestWithGroupsWithTargets>,
}

impl ListPastRequestsForUser {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            now,
            trees: Vec::new(),
        }
    }
}

impl AccessPattern for ListPastRequestsForUser {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.user_id)?;
        Ok(
            QueryInput::on_index(Index::Gsi1, keys::user_partition(&self.user_id))
                .with_sort_key(SortKeyCondition::LessThan(keys::upcoming_boundary(self.now)))
                .reverse(),
        )
    }
}

impl QueryUnmarshal for ListPastRequestsForUser {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        unmarshal_trees(&mut self.trees, page, ScanDirection::Reverse, Some(Index::Gsi1))
    }
}

/// Requests in one status, ascending by id
#[derive(Debug, Clone)]
pub struct ListRequestsForStatus {
    pub status: RequestStatus,
    pub trees: Vec<RequestWithGroupsWithTargets>,
}

impl ListRequestsForStatus {
    pub fn new(status: RequestStatus) -> Self {
        Self {
            status,
            trees: Vec::new(),
        }
    }
}

impl AccessPattern for ListRequestsForStatus {
    fn build_query(&self) -> Result<QueryInput> {
        Ok(QueryInput::on_index(
            Index::Gsi2,
            keys::status_partition(self.status),
        ))
    }
}

impl QueryUnmarshal for ListRequestsForStatus {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        unmarshal_trees(&mut self.trees, page, ScanDirection::Forward, Some(Index::Gsi2))
    }
}

/// A user's requests in one status, latest end time first.
///
/// Reads the user's partition and keeps only trees in `status` once they are
/// assembled. A page can therefore yield fewer trees than it read, or none,
/// while still returning a cursor.
#[derive(Debug, Clone)]
pub struct ListRequestsForUserAndStatus {
    pub user_id: String,
    pub status: RequestStatus,
    pub trees: Vec<RequestWithGroupsWithTargets>,
}

impl ListRequestsForUserAndStatus {
    pub fn new(user_id: impl Into<String>, status: RequestStatus) -> Self {
        Self {
            user_id: user_id.into(),
            status,
            trees: Vec::new(),
        }
    }
}

impl AccessPattern for ListRequestsForUserAndStatus {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.user_id)?;
        Ok(QueryInput::on_index(Index::Gsi1, keys::user_partition(&self.user_id)).reverse())
    }
}

impl QueryUnmarshal for ListRequestsForUserAndStatus {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        let mut trees = Vec::new();
        let next = unmarshal_trees(&mut trees, page, ScanDirection::Reverse, Some(Index::Gsi1))?;
        self.trees
            .extend(trees.into_iter().filter(|t| t.request.status == self.status));
        Ok(next)
    }
}

/// Requests made against one rule, ascending by id
#[derive(Debug, Clone, Default)]
pub struct ListRequestsForRule {
    pub rule_id: String,
    pub trees: Vec<RequestWithGroupsWithTargets>,
}

impl ListRequestsForRule {
    pub fn new(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            trees: Vec::new(),
        }
    }
}

impl AccessPattern for ListRequestsForRule {
    fn build_query(&self) -> Result<QueryInput> {
        validate_id(&self.rule_id)?;
        Ok(QueryInput::on_index(
            Index::Gsi3,
            keys::rule_partition(&self.rule_id),
        ))
    }
}

impl QueryUnmarshal for ListRequestsForRule {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        unmarshal_trees(&mut self.trees, page, ScanDirection::Forward, Some(Index::Gsi3))
    }
}

/// All requests ending after `now`, soonest first
#[derive(Debug, Clone)]
pub struct ListUpcomingRequests {
    pub now: DateTime<Utc>,
    pub trees: Vec<RequestWithGroupsWithTargets>,
}

impl ListUpcomingRequests {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            trees: Vec::new(),
        }
    }
}

impl AccessPattern for ListUpcomingRequests {
    fn build_query(&self) -> Result<QueryInput> {
        Ok(
            QueryInput::on_index(Index::Gsi4, keys::REQUEST_PARTITION).with_sort_key(
                SortKeyCondition::GreaterOrEqual(keys::upcoming_boundary(self.now)),
            ),
        )
    }
}

impl QueryUnmarshal for ListUpcomingRequests {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        unmarshal_trees(&mut self.trees, page, ScanDirection::Forward, Some(Index::Gsi4))
    }
}

/// All requests that ended at or before `now`, most recent first
#[derive(Debug, Clone)]
pub struct ListPastRequests {
    pub now: DateTime<Utc>,
    pub trees: Vec<RequestWithGroupsWithTargets>,
}

impl ListPastRequests {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            trees: Vec::new(),
        }
    }
}

impl AccessPattern for ListPastRequests {
    fn build_query(&self) -> Result<QueryInput> {
        Ok(QueryInput::on_index(Index::Gsi4, keys::REQUEST_PARTITION)
            .with_sort_key(SortKeyCondition::LessThan(keys::upcoming_boundary(self.now)))
            .reverse())
    }
}

impl QueryUnmarshal for ListPastRequests {
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>> {
        unmarshal_trees(&mut self.trees, page, ScanDirection::Reverse, Some(Index::Gsi4))
    }
}
