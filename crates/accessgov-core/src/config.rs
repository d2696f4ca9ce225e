//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid configuration. Call [`EngineConfig::validate`] before use.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{AccessError, Result};
use crate::logging_facility::{self, Profile};

/// Largest page any query may request; also the largest entity that can be
/// reassembled from one page.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// Items per `put_batch` / `delete_batch` call.
pub const DEFAULT_MAX_BATCH_ITEMS: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_page_size: usize,
    pub max_batch_items: usize,
    /// On-disk SQLite database; `None` keeps everything in memory
    pub sqlite_path: Option<PathBuf>,
    pub log_profile: Profile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_batch_items: DEFAULT_MAX_BATCH_ITEMS,
            sqlite_path: None,
            log_profile: Profile::Development,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the document does not parse or fails
    /// [`EngineConfig::validate`].
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s).map_err(|e| AccessError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` if:
    /// - `max_page_size` is zero
    /// - `max_batch_items` is zero or larger than `max_page_size`
    pub fn validate(&self) -> Result<()> {
        if self.max_page_size == 0 {
            return Err(AccessError::InvalidConfig {
                reason: "max_page_size must be > 0".to_string(),
            });
        }
        if self.max_batch_items == 0 {
            return Err(AccessError::InvalidConfig {
                reason: "max_batch_items must be > 0".to_string(),
            });
        }
        if self.max_batch_items > self.max_page_size {
            return Err(AccessError::InvalidConfig {
                reason: format!(
                    "max_batch_items ({}) must not exceed max_page_size ({})",
                    self.max_batch_items, self.max_page_size
                ),
            });
        }
        Ok(())
    }

    /// Install the global subscriber for `log_profile`
    pub fn init_logging(&self) {
        logging_facility::init(self.log_profile);
    }

    /// Clamp a caller-supplied page size into `1..=max_page_size`
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.max_page_size)
            .clamp(1, self.max_page_size)
    }
}
