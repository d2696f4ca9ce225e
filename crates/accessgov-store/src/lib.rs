//! Access governance store - key layout, backends and reassembly
//!
//! Provides:
//! - Key codec packing Request → Access Group → Group Target into one
//!   partition with four secondary indexes
//! - `ItemStore` contract with in-memory and SQLite backends
//! - Forward, reverse and paginated tree assembly
//! - Query abstraction layer and the concrete access patterns
//! - Cascade planning and chunked batch writes

pub mod access;
pub mod assemble;
pub mod backend;
pub mod batch;
pub mod cascade;
pub mod cursor;
pub mod db;
pub mod errors;
pub mod item;
pub mod keys;
pub mod migrations;
pub mod query;

// Re-export key types
pub use access::{run_all, run_query, AccessPattern, QueryOptions, QueryOutcome, QueryUnmarshal};
pub use backend::{open_store, ItemStore, MemoryStore, SqliteStore};
pub use batch::BatchWriter;
pub use cascade::{plan_request_delete, plan_request_items, plan_request_update, CascadePlan};
pub use cursor::Cursor;
pub use errors::Result;
pub use item::{Index, PrimaryKey, RawItem};
pub use query::{Filter, QueryInput, QueryPage, ScanDirection, SortKeyCondition};
