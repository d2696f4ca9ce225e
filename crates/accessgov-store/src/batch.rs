//! Chunked batch writes

use accessgov_core::ExError;

use crate::backend::ItemStore;
use crate::errors::{partial_batch_write, Result};
use crate::item::{PrimaryKey, RawItem};

/// Splits long item lists into chunks the store accepts.
///
/// Each chunk is applied independently. When a chunk fails after earlier
/// chunks were written the error is `PartialBatchWrite` carrying how many
/// items made it; when nothing was written the store's error is returned
/// unchanged. Cascades are idempotent, so the caller may retry the whole list.
pub struct BatchWriter<'a> {
    store: &'a dyn ItemStore,
    chunk_size: usize,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a dyn ItemStore) -> Self {
        Self {
            chunk_size: store.max_batch_items().max(1),
            store,
        }
    }

    /// Use chunks smaller than the store's limit
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, self.store.max_batch_items().max(1));
        self
    }

    /// Write every item, returning how many were written
    pub fn put_all(&self, items: Vec<RawItem>) -> Result<usize> {
        let total = items.len();
        let mut written = 0;
        let mut items = items.into_iter().peekable();
        while items.peek().is_some() {
            let chunk: Vec<RawItem> = items.by_ref().take(self.chunk_size).collect();
            let len = chunk.len();
            self.store
                .put_batch(chunk)
                .map_err(|e| stop("put_batch", written, total, e))?;
            written += len;
        }
        tracing::debug!(item_count = written, "batch put complete");
        Ok(written)
    }

    /// Delete every key, returning how many deletes were issued
    pub fn delete_all(&self, keys: Vec<PrimaryKey>) -> Result<usize> {
        let total = keys.len();
        let mut written = 0;
        for chunk in keys.chunks(self.chunk_size) {
            self.store
                .delete_batch(chunk.to_vec())
                .map_err(|e| stop("delete_batch", written, total, e))?;
            written += chunk.len();
        }
        tracing::debug!(item_count = written, "batch delete complete");
        Ok(written)
    }
}

fn stop(op: &str, written: usize, total: usize, err: ExError) -> ExError {
    if written == 0 {
        err
    } else {
        tracing::debug!(op, written, total, "batch write stopped part way");
        partial_batch_write(op, written, total, err)
    }
}
