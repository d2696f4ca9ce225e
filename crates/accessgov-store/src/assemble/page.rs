//! Multi-tree assembly from one bounded page
//!
//! A page is a window of the scan; the last request in it may be cut short.
//! Each request carries `group_target_count`, the number of targets stored
//! under it, so a tree is complete exactly when that many targets have been
//! collected and its request item has been seen.

use accessgov_core::errors::AccessError;
use accessgov_core::{Request, RequestWithGroupsWithTargets};

use crate::cursor::Cursor;
use crate::errors::Result;
use crate::item::{Index, RawItem};
use crate::keys::{classify_sort_key, ItemKind};
use crate::query::{QueryPage, ScanDirection};

use super::tree::{assemble_forward, assemble_reverse};

/// Complete trees from one page and where the next page starts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledPage {
    pub trees: Vec<RequestWithGroupsWithTargets>,
    pub next_cursor: Option<Cursor>,
}

/// Contiguous items of one request within the page
struct Run<'a> {
    request_id: String,
    items: &'a [RawItem],
}

impl Run<'_> {
    /// `(expected, collected)` targets; `expected` is `None` until the
    /// request item is present
    fn target_counts(&self) -> Result<(Option<usize>, usize)> {
        let mut expected = None;
        let mut collected = 0;
        for item in self.items {
            match classify_sort_key(&item.key.sk)? {
                ItemKind::Request { .. } => {
                    let request: Request = item.decode()?;
                    expected = Some(request.group_target_count);
                }
                ItemKind::Target { .. } => collected += 1,
                _ => {}
            }
        }
        Ok((expected, collected))
    }

    fn is_complete(&self) -> Result<bool> {
        let (expected, collected) = self.target_counts()?;
        Ok(expected == Some(collected))
    }

    fn mismatch(&self) -> Result<AccessError> {
        let (expected, collected) = self.target_counts()?;
        Ok(match expected {
            Some(expected) => AccessError::GroupTargetCountMismatch {
                request_id: self.request_id.clone(),
                expected,
                actual: collected,
            },
            None => AccessError::OrphanItem {
                sort_key: self
                    .items
                    .first()
                    .map(|i| i.key.sk.clone())
                    .unwrap_or_default(),
            },
        })
    }

    fn assemble(&self, direction: ScanDirection) -> Result<RequestWithGroupsWithTargets> {
        match direction {
            ScanDirection::Forward => assemble_forward(self.items),
            ScanDirection::Reverse => assemble_reverse(self.items),
        }
    }
}

fn split_runs(items: &[RawItem]) -> Result<Vec<Run<'_>>> {
    let mut runs: Vec<Run<'_>> = Vec::new();
    let mut start = 0;
    let mut current: Option<String> = None;

    for (i, item) in items.iter().enumerate() {
        let kind = classify_sort_key(&item.key.sk)?;
        let request_id = kind.request_id();
        match &current {
            Some(id) if id == request_id => {}
            Some(id) => {
                runs.push(Run {
                    request_id: id.clone(),
                    items: &items[start..i],
                });
                start = i;
                current = Some(request_id.to_string());
            }
            None => current = Some(request_id.to_string()),
        }
    }
    if let Some(id) = current {
        runs.push(Run {
            request_id: id,
            items: &items[start..],
        });
    }
    Ok(runs)
}

/// Assemble every complete request tree in `page`.
///
/// - Every request except the last must be complete; otherwise its
///   `group_target_count` contradicts the stored data and the page fails
///   with `GroupTargetCountMismatch`.
/// - A complete last request is kept and the store's own cursor is passed
///   on.
/// - An incomplete last request is dropped and the cursor moves to the last
///   item of the previous tree, so the next page starts with it.
/// - An incomplete last request with nothing before it cannot ever be read
///   whole at this page size: `EntityTooLarge`.
///
/// `index` is the index the page was read from, so the cursor carries the
/// right index key.
pub fn assemble_page(
    page: QueryPage,
    direction: ScanDirection,
    index: Option<Index>,
) -> Result<AssembledPage> {
    let runs = split_runs(&page.items)?;
    let Some((last, complete)) = runs.split_last() else {
        return Ok(AssembledPage {
            trees: Vec::new(),
            next_cursor: page.last_evaluated,
        });
    };

    let mut trees = Vec::with_capacity(runs.len());
    for run in complete {
        if !run.is_complete()? {
            return Err(run.mismatch()?.into());
        }
        trees.push(run.assemble(direction)?);
    }

    let next_cursor = if last.is_complete()? {
        trees.push(last.assemble(direction)?);
        page.last_evaluated
    } else if let Some(previous) = complete.last() {
        tracing::debug!(
            request_id = %last.request_id,
            item_count = last.items.len(),
            "trailing request cut by page boundary"
        );
        previous.items.last().map(|item| Cursor::after(item, index))
    } else if page.last_evaluated.is_some() {
        return Err(AccessError::EntityTooLarge {
            request_id: last.request_id.clone(),
            page_size: page.items.len(),
        }
        .into());
    } else {
        return Err(last.mismatch()?.into());
    };

    Ok(AssembledPage { trees, next_cursor })
}
