//! Query abstraction layer
//!
//! Every read the engine performs is an access pattern: a value that knows
//! how to build its [`QueryInput`] and how to turn a page of raw items into
//! its own result. [`run_query`] reads one page, [`run_all`] follows cursors
//! until the scan is exhausted.

mod requests;
mod reviewers;

pub use requests::{
    GetRequestWithGroupsWithTargets, ListPastRequests, ListPastRequestsForUser,
    ListRequestsForRule, ListRequestsForStatus, ListRequestsForUser,
    ListRequestsForUserAndStatus, ListRequestsWithGroupsWithTargets, ListUpcomingRequests,
    ListUpcomingRequestsForUser,
};
pub use reviewers::{
    GetRequestReviewer, ListPastReviewerRequests, ListRequestReviewers, ListReviewerRequests,
    ListReviewerRequestsForStatus, ListUpcomingReviewerRequests,
};

use accessgov_core::errors::AccessError;
use accessgov_core::RequestWithGroupsWithTargets;

use crate::assemble::assemble_page;
use crate::backend::ItemStore;
use crate::cursor::Cursor;
use crate::errors::Result;
use crate::item::Index;
use crate::query::{QueryInput, QueryPage, ScanDirection};

/// Builds the store query for one access pattern
pub trait AccessPattern {
    /// # Errors
    ///
    /// Returns `InvalidInput` when an identifier cannot be embedded in a key.
    fn build_query(&self) -> Result<QueryInput>;
}

/// Consumes pages of an access pattern's query
pub trait QueryUnmarshal: AccessPattern {
    /// Fold `page` into the pattern's result, returning where the next page
    /// starts (or `None` when nothing is left).
    ///
    /// # Errors
    ///
    /// Returns assembly errors (`EntityTooLarge`, `ConstraintViolation`,
    /// `InvalidInput`) or `Serialization` for undecodable items.
    fn unmarshal(&mut self, page: QueryPage) -> Result<Option<Cursor>>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Items evaluated per page; `None` leaves the pattern's own limit
    pub page_size: Option<usize>,
    /// Start after this position
    pub cursor: Option<Cursor>,
}

impl QueryOptions {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            cursor: None,
        }
    }

    /// Options from a caller-supplied cursor token
    ///
    /// # Errors
    ///
    /// Returns `InvalidCursor` if `token` was not produced by
    /// [`QueryOutcome::next_token`].
    pub fn from_token(page_size: Option<usize>, token: Option<&str>) -> Result<Self> {
        Ok(Self {
            page_size,
            cursor: token.map(Cursor::decode).transpose()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub next_cursor: Option<Cursor>,
}

impl QueryOutcome {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Opaque token for the next page
    pub fn next_token(&self) -> Result<Option<String>> {
        self.next_cursor.as_ref().map(Cursor::encode).transpose()
    }
}

/// Read one page of `pattern`.
///
/// # Errors
///
/// Returns `InvalidInput` for a zero page size, and whatever building,
/// reading or unmarshalling the page fails with.
pub fn run_query<Q>(
    store: &dyn ItemStore,
    pattern: &mut Q,
    options: QueryOptions,
) -> Result<QueryOutcome>
where
    Q: QueryUnmarshal + ?Sized,
{
    let mut input = pattern.build_query()?;
    if let Some(page_size) = options.page_size {
        if page_size == 0 {
            return Err(AccessError::InvalidRequest {
                reason: "page size must be at least 1".to_string(),
            }
            .into());
        }
        input.limit = Some(page_size);
    }

    let page = store.query(&input, options.cursor.as_ref())?;
    tracing::debug!(
        index = ?input.index,
        partition = %input.partition_key,
        item_count = page.items.len(),
        "access pattern page read"
    );
    let next_cursor = pattern.unmarshal(page)?;
    Ok(QueryOutcome { next_cursor })
}

/// Read every page of `pattern`, starting at `options.cursor`.
///
/// # Errors
///
/// As [`run_query`]; also `Internal` if the store hands back the cursor it
/// was given.
pub fn run_all<Q>(store: &dyn ItemStore, pattern: &mut Q, options: QueryOptions) -> Result<()>
where
    Q: QueryUnmarshal + ?Sized,
{
    let mut cursor = options.cursor;
    let mut pages = 0usize;
    loop {
        let outcome = run_query(
            store,
            pattern,
            QueryOptions {
                page_size: options.page_size,
                cursor: cursor.clone(),
            },
        )?;
        pages += 1;
        match outcome.next_cursor {
            None => {
                tracing::debug!(pages, "access pattern exhausted");
                return Ok(());
            }
            Some(next) if cursor.as_ref() == Some(&next) => {
                return Err(AccessError::Internal {
                    message: "query cursor did not advance".to_string(),
                }
                .into());
            }
            Some(next) => cursor = Some(next),
        }
    }
}

/// Append the complete trees of `page` to `trees`
pub(crate) fn unmarshal_trees(
    trees: &mut Vec<RequestWithGroupsWithTargets>,
    page: QueryPage,
    direction: ScanDirection,
    index: Option<Index>,
) -> Result<Option<Cursor>> {
    let assembled = assemble_page(page, direction, index)?;
    trees.extend(assembled.trees);
    Ok(assembled.next_cursor)
}
