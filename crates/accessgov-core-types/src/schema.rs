//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across the engine, the store
//! and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_OPERATION_ID: &str = "operation_id";
pub const FIELD_TRACE_ID: &str = "trace_id";
pub const FIELD_SPAN_ID: &str = "span_id";

// Entity identifiers
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_GROUP_ID: &str = "group_id";
pub const FIELD_TARGET_ID: &str = "target_id";
pub const FIELD_REVIEWER_ID: &str = "reviewer_id";

// Collection sizes
pub const FIELD_ITEM_COUNT: &str = "item_count";
pub const FIELD_TREE_COUNT: &str = "tree_count";
pub const FIELD_PAGE_SIZE: &str = "page_size";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
