//! Engine-level read-only query surface.
//!
//! `apply_engine_query` is the single entry point for every read. Unlike
//! `apply_engine_command` it only needs the item store and the
//! configuration, and it never writes.
//!
//! List queries return one page at a time. A page holds whole request trees
//! only, so it can carry fewer trees than `page_size` suggests; keep
//! following `cursor` while `has_more` is set.

#![allow(clippy::result_large_err)]

use accessgov_core::{
    log_op_end, log_op_error, log_op_start, EngineConfig, RequestStatus,
    RequestWithGroupsWithTargets, Reviewer,
};
use accessgov_store::access::{
    GetRequestReviewer, GetRequestWithGroupsWithTargets, ListPastRequests,
    ListPastRequestsForUser, ListPastReviewerRequests, ListRequestReviewers,
    ListRequestsForRule, ListRequestsForStatus, ListRequestsForUser,
    ListRequestsForUserAndStatus, ListRequestsWithGroupsWithTargets, ListReviewerRequests,
    ListReviewerRequestsForStatus, ListUpcomingRequests, ListUpcomingRequestsForUser,
    ListUpcomingReviewerRequests,
};
use accessgov_store::errors::Result;
use accessgov_store::{run_all, run_query, ItemStore, QueryOptions, QueryUnmarshal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Pagination options for list queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Items evaluated per page, clamped to `1..=max_page_size`
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Opaque cursor from a previous page
    #[serde(default)]
    pub cursor: Option<String>,
}

impl ListOptions {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            cursor: None,
        }
    }

    /// Same page size, continuing from `cursor`
    pub fn after(&self, cursor: impl Into<String>) -> Self {
        Self {
            page_size: self.page_size,
            cursor: Some(cursor.into()),
        }
    }
}

/// A paginated page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque cursor for the next page; `None` when this is the last page.
    pub cursor: Option<String>,
    pub has_more: bool,
}

// ---------------------------------------------------------------------------
// EngineQuery
// ---------------------------------------------------------------------------

/// Read-only queries supported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum EngineQuery {
    // ── Requests ─────────────────────────────────────────────────────────────
    /// One request tree, read in full.
    RequestGet { request_id: String },
    /// Every request, ascending by request id.
    RequestList { options: ListOptions },
    /// A user's requests, latest end time first.
    RequestListForUser { user_id: String, options: ListOptions },
    /// A user's requests that have not ended, soonest end first.
    RequestListUpcomingForUser { user_id: String, options: ListOptions },
    /// A user's requests that have ended, latest end first.
    RequestListPastForUser { user_id: String, options: ListOptions },
    RequestListForStatus {
        status: RequestStatus,
        options: ListOptions,
    },
    RequestListForUserAndStatus {
        user_id: String,
        status: RequestStatus,
        options: ListOptions,
    },
    RequestListForRule { rule_id: String, options: ListOptions },
    RequestListUpcoming { options: ListOptions },
    RequestListPast { options: ListOptions },

    // ── Reviewers ────────────────────────────────────────────────────────────
    ReviewerGet {
        request_id: String,
        reviewer_id: String,
    },
    /// Reviewers of one request, ascending by reviewer id.
    ReviewerListForRequest {
        request_id: String,
        options: ListOptions,
    },
    /// Requests a reviewer is on, latest end time first.
    ReviewerListRequests {
        reviewer_id: String,
        options: ListOptions,
    },
    ReviewerListRequestsForStatus {
        reviewer_id: String,
        status: RequestStatus,
        options: ListOptions,
    },
    ReviewerListUpcoming {
        reviewer_id: String,
        options: ListOptions,
    },
    ReviewerListPast {
        reviewer_id: String,
        options: ListOptions,
    },
}

impl EngineQuery {
    /// Operation name used in boundary logs
    pub fn op_name(&self) -> &'static str {
        match self {
            EngineQuery::RequestGet { .. } => "request_get",
            EngineQuery::RequestList { .. } => "request_list",
            EngineQuery::RequestListForUser { .. } => "request_list_for_user",
            EngineQuery::RequestListUpcomingForUser { .. } => "request_list_upcoming_for_user",
            EngineQuery::RequestListPastForUser { .. } => "request_list_past_for_user",
            EngineQuery::RequestListForStatus { .. } => "request_list_for_status",
            EngineQuery::RequestListForUserAndStatus { .. } => "request_list_for_user_and_status",
            EngineQuery::RequestListForRule { .. } => "request_list_for_rule",
            EngineQuery::RequestListUpcoming { .. } => "request_list_upcoming",
            EngineQuery::RequestListPast { .. } => "request_list_past",
            EngineQuery::ReviewerGet { .. } => "reviewer_get",
            EngineQuery::ReviewerListForRequest { .. } => "reviewer_list_for_request",
            EngineQuery::ReviewerListRequests { .. } => "reviewer_list_requests",
            EngineQuery::ReviewerListRequestsForStatus { .. } => {
                "reviewer_list_requests_for_status"
            }
            EngineQuery::ReviewerListUpcoming { .. } => "reviewer_list_upcoming",
            EngineQuery::ReviewerListPast { .. } => "reviewer_list_past",
        }
    }
}

/// Result of an engine query.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineQueryResult {
    Request(Box<RequestWithGroupsWithTargets>),
    RequestPage(Page<RequestWithGroupsWithTargets>),
    Reviewer(Box<Reviewer>),
    ReviewerPage(Page<Reviewer>),
}

// ---------------------------------------------------------------------------
// apply_engine_query
// ---------------------------------------------------------------------------

/// Execute a read-only query against `store`.
///
/// `now` splits upcoming from past for the time-window queries.
///
/// # Errors
///
/// - `NotFound`: a get query matched nothing
/// - `InvalidInput`: malformed identifiers
/// - `InvalidCursor`: a cursor that was not produced by an earlier page
/// - `EntityTooLarge`: a single request does not fit in `page_size` items
pub fn apply_engine_query(
    query: EngineQuery,
    store: &dyn ItemStore,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<EngineQueryResult> {
    let op = query.op_name();
    log_op_start!(op);
    let start = std::time::Instant::now();

    let result = dispatch(query, store, config, now);

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(r) => log_op_end!(op, duration_ms = elapsed, item_count = r.item_count()),
        Err(e) => {
            let e_clone = e.clone();
            log_op_error!(op, e_clone, duration_ms = elapsed);
        }
    }
    result
}

impl EngineQueryResult {
    fn item_count(&self) -> usize {
        match self {
            EngineQueryResult::Request(_) | EngineQueryResult::Reviewer(_) => 1,
            EngineQueryResult::RequestPage(page) => page.items.len(),
            EngineQueryResult::ReviewerPage(page) => page.items.len(),
        }
    }
}

fn dispatch(
    query: EngineQuery,
    store: &dyn ItemStore,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<EngineQueryResult> {
    use EngineQuery as Q;

    let result = match query {
        Q::RequestGet { request_id } => {
            let mut get = GetRequestWithGroupsWithTargets::new(request_id);
            run_all(
                store,
                &mut get,
                QueryOptions::with_page_size(config.max_page_size),
            )?;
            EngineQueryResult::Request(Box::new(get.into_result()?))
        }
        Q::RequestList { options } => EngineQueryResult::RequestPage(page_of(
            store,
            config,
            &options,
            ListRequestsWithGroupsWithTargets::new(),
            |p| p.trees,
        )?),
        Q::RequestListForUser { user_id, options } => EngineQueryResult::RequestPage(page_of(
            store,
            config,
            &options,
            ListRequestsForUser::new(user_id),
            |p| p.trees,
        )?),
        Q::RequestListUpcomingForUser { user_id, options } => {
            EngineQueryResult::RequestPage(page_of(
                store,
                config,
                &options,
                ListUpcomingRequestsForUser::new(user_id, now),
                |p| p.trees,
            )?)
        }
        Q::RequestListPastForUser { user_id, options } => EngineQueryResult::RequestPage(page_of(
            store,
            config,
            &options,
            ListPastRequestsForUser::new(user_id, now),
            |p| p.trees,
        )?),
        Q::RequestListForStatus { status, options } => EngineQueryResult::RequestPage(page_of(
            store,
            config,
            &options,
            ListRequestsForStatus::new(status),
            |p| p.trees,
        )?),
        Q::RequestListForUserAndStatus {
            user_id,
            status,
            options,
        } => EngineQueryResult::RequestPage(page_of(
            store,
            config,
            &options,
            ListRequestsForUserAndStatus::new(user_id, status),
            |p| p.trees,
        )?),
        Q::RequestListForRule { rule_id, options } => EngineQueryResult::RequestPage(page_of(
            store,
            config,
            &options,
            ListRequestsForRule::new(rule_id),
            |p| p.trees,
        )?),
        Q::RequestListUpcoming { options } => EngineQueryResult::RequestPage(page_of(
            store,
            config,
            &options,
            ListUpcomingRequests::new(now),
            |p| p.trees,
        )?),
        Q::RequestListPast { options } => EngineQueryResult::RequestPage(page_of(
            store,
            config,
            &options,
            ListPastRequests::new(now),
            |p| p.trees,
        )?),

        Q::ReviewerGet {
            request_id,
            reviewer_id,
        } => {
            let mut get = GetRequestReviewer::new(request_id, reviewer_id);
            run_query(store, &mut get, QueryOptions::default())?;
            let reviewer = get.result.ok_or_else(|| {
                accessgov_core::AccessError::Internal {
                    message: "reviewer query returned no result".to_string(),
                }
            })?;
            EngineQueryResult::Reviewer(Box::new(reviewer))
        }
        Q::ReviewerListForRequest {
            request_id,
            options,
        } => EngineQueryResult::ReviewerPage(page_of(
            store,
            config,
            &options,
            ListRequestReviewers::new(request_id),
            |p| p.reviewers,
        )?),
        Q::ReviewerListRequests {
            reviewer_id,
            options,
        } => EngineQueryResult::ReviewerPage(page_of(
            store,
            config,
            &options,
            ListReviewerRequests::new(reviewer_id),
            |p| p.reviewers,
        )?),
        Q::ReviewerListRequestsForStatus {
            reviewer_id,
            status,
            options,
        } => EngineQueryResult::ReviewerPage(page_of(
            store,
            config,
            &options,
            ListReviewerRequestsForStatus::new(reviewer_id, status),
            |p| p.reviewers,
        )?),
        Q::ReviewerListUpcoming {
            reviewer_id,
            options,
        } => EngineQueryResult::ReviewerPage(page_of(
            store,
            config,
            &options,
            ListUpcomingReviewerRequests::new(reviewer_id, now),
            |p| p.reviewers,
        )?),
        Q::ReviewerListPast {
            reviewer_id,
            options,
        } => EngineQueryResult::ReviewerPage(page_of(
            store,
            config,
            &options,
            ListPastReviewerRequests::new(reviewer_id, now),
            |p| p.reviewers,
        )?),
    };
    Ok(result)
}

/// Read one page of `pattern` and take its items
fn page_of<P, T>(
    store: &dyn ItemStore,
    config: &EngineConfig,
    options: &ListOptions,
    mut pattern: P,
    take: impl FnOnce(P) -> Vec<T>,
) -> Result<Page<T>>
where
    P: QueryUnmarshal,
{
    let query_options = QueryOptions::from_token(
        Some(config.page_size(options.page_size)),
        options.cursor.as_deref(),
    )?;
    let outcome = run_query(store, &mut pattern, query_options)?;
    Ok(Page {
        items: take(pattern),
        cursor: outcome.next_token()?,
        has_more: outcome.has_more(),
    })
}
