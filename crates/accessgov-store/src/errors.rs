//! Error helpers for accessgov-store
//!
//! Store operations return the core `ExError` directly; these helpers build
//! the common cases with a consistent `op` tag.

use accessgov_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

pub fn serialization_error(op: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(op.to_string())
        .with_message(err.to_string())
}

pub fn lock_poisoned(op: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(op.to_string())
        .with_message("store lock poisoned")
}

pub fn invalid_cursor(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidCursor)
        .with_op("cursor_decode")
        .with_message(format!("Invalid cursor: {}", reason))
}

pub fn batch_too_large(op: &str, len: usize, max: usize) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op(op.to_string())
        .with_message(format!("batch of {} items exceeds the limit of {}", len, max))
}

/// A batched write stopped after `written` of `total` items
pub fn partial_batch_write(op: &str, written: usize, total: usize, source: ExError) -> ExError {
    ExError::new(ExErrorKind::PartialBatchWrite)
        .with_op(op.to_string())
        .with_message(format!("write stopped: {}", source.message()))
        .with_progress(written, total)
        .with_source(source)
}
