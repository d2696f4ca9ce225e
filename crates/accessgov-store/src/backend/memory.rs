use std::collections::BTreeMap;
use std::sync::RwLock;

use accessgov_core::config::DEFAULT_MAX_BATCH_ITEMS;

use crate::cursor::{item_position, Cursor};
use crate::errors::{batch_too_large, lock_poisoned, Result};
use crate::item::{PrimaryKey, RawItem};
use crate::query::{QueryInput, QueryPage, ScanDirection};

use super::{paginate, ItemStore};

/// In-process store over an ordered map
pub struct MemoryStore {
    items: RwLock<BTreeMap<PrimaryKey, RawItem>>,
    max_batch_items: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_batch_items(DEFAULT_MAX_BATCH_ITEMS)
    }

    pub fn with_max_batch_items(max_batch_items: usize) -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            max_batch_items,
        }
    }

    /// # Errors
    ///
    /// Returns `Persistence` if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        let items = self.items.read().map_err(|_| lock_poisoned("len"))?;
        Ok(items.len())
    }

    /// # Errors
    ///
    /// Returns `Persistence` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, key: &PrimaryKey) -> Result<Option<RawItem>> {
        let items = self.items.read().map_err(|_| lock_poisoned("get"))?;
        Ok(items.get(key).cloned())
    }
}

impl ItemStore for MemoryStore {
    fn max_batch_items(&self) -> usize {
        self.max_batch_items
    }

    fn put(&self, item: RawItem) -> Result<()> {
        let mut items = self.items.write().map_err(|_| lock_poisoned("put"))?;
        items.insert(item.key.clone(), item);
        Ok(())
    }

    fn put_batch(&self, batch: Vec<RawItem>) -> Result<()> {
        if batch.len() > self.max_batch_items {
            return Err(batch_too_large("put_batch", batch.len(), self.max_batch_items));
        }
        let mut items = self.items.write().map_err(|_| lock_poisoned("put_batch"))?;
        for item in batch {
            items.insert(item.key.clone(), item);
        }
        Ok(())
    }

    fn delete_batch(&self, keys: Vec<PrimaryKey>) -> Result<()> {
        if keys.len() > self.max_batch_items {
            return Err(batch_too_large("delete_batch", keys.len(), self.max_batch_items));
        }
        let mut items = self
            .items
            .write()
            .map_err(|_| lock_poisoned("delete_batch"))?;
        for key in &keys {
            items.remove(key);
        }
        Ok(())
    }

    fn query(&self, input: &QueryInput, start: Option<&Cursor>) -> Result<QueryPage> {
        let items = self.items.read().map_err(|_| lock_poisoned("query"))?;

        let mut candidates: Vec<&RawItem> = items.values().filter(|i| input.selects(i)).collect();
        candidates.sort_by(|a, b| item_position(a, input.index).cmp(&item_position(b, input.index)));
        if input.direction == ScanDirection::Reverse {
            candidates.reverse();
        }

        let after_start = candidates.into_iter().filter(|item| match start {
            None => true,
            Some(cursor) => {
                let pos = item_position(item, input.index);
                let from = cursor.position(input.index);
                match input.direction {
                    ScanDirection::Forward => pos > from,
                    ScanDirection::Reverse => pos < from,
                }
            }
        });

        let page = paginate(input, after_start.cloned());
        tracing::debug!(
            index = ?input.index,
            partition = %input.partition_key,
            item_count = page.items.len(),
            has_more = page.last_evaluated.is_some(),
            "memory query"
        );
        Ok(page)
    }
}
