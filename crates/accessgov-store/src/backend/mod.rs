//! Key-value store contract and its backends

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use accessgov_core::EngineConfig;

use crate::cursor::Cursor;
use crate::errors::Result;
use crate::item::{PrimaryKey, RawItem};
use crate::query::{QueryInput, QueryPage};

/// Partition/sort-key store with four secondary indexes.
///
/// Writes are atomic per item only. `put_batch` and `delete_batch` accept at
/// most [`ItemStore::max_batch_items`] entries; use [`crate::BatchWriter`]
/// for longer lists.
pub trait ItemStore: Send + Sync {
    fn max_batch_items(&self) -> usize;

    /// Insert or replace one item
    ///
    /// # Errors
    ///
    /// Returns `Persistence` when the backend fails.
    fn put(&self, item: RawItem) -> Result<()>;

    /// Insert or replace up to `max_batch_items` items
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for oversized batches and `Persistence` when
    /// the backend fails.
    fn put_batch(&self, items: Vec<RawItem>) -> Result<()>;

    /// Delete up to `max_batch_items` items; missing keys are ignored
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for oversized batches and `Persistence` when
    /// the backend fails.
    fn delete_batch(&self, keys: Vec<PrimaryKey>) -> Result<()>;

    /// Read one page, starting after `start` when given
    ///
    /// # Errors
    ///
    /// Returns `Persistence` or `Serialization` when the backend fails.
    fn query(&self, input: &QueryInput, start: Option<&Cursor>) -> Result<QueryPage>;
}

/// Open the store `config` describes: SQLite at `sqlite_path` when set,
/// otherwise an empty in-memory store. Both use `max_batch_items`.
///
/// # Errors
///
/// Returns `Persistence` if the database cannot be opened or migrated.
pub fn open_store(config: &EngineConfig) -> Result<Box<dyn ItemStore>> {
    match &config.sqlite_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "opening sqlite store");
            Ok(Box::new(
                SqliteStore::open(path)?.with_max_batch_items(config.max_batch_items),
            ))
        }
        None => Ok(Box::new(MemoryStore::with_max_batch_items(
            config.max_batch_items,
        ))),
    }
}

/// Cut a page out of candidates that already match the partition, the sort
/// key condition and the start cursor, in scan order.
///
/// `limit` counts items before the filter. The cursor is set only when at
/// least one candidate is left over.
pub(crate) fn paginate(
    input: &QueryInput,
    candidates: impl IntoIterator<Item = RawItem>,
) -> QueryPage {
    let mut candidates = candidates.into_iter();
    let evaluated: Vec<RawItem> = match input.limit {
        Some(limit) => candidates.by_ref().take(limit).collect(),
        None => candidates.by_ref().collect(),
    };

    let last_evaluated = match (evaluated.last(), candidates.next()) {
        (Some(last), Some(_)) => Some(Cursor::after(last, input.index)),
        _ => None,
    };

    let items = match &input.filter {
        Some(filter) => evaluated
            .into_iter()
            .filter(|item| filter.matches(&item.data))
            .collect(),
        None => evaluated,
    };

    QueryPage {
        items,
        last_evaluated,
    }
}
