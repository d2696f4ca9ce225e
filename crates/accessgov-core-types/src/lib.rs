//! Core types shared across accessgov facilities
//!
//! This crate provides foundational types used by both error handling
//! and logging facilities:
//!
//! - **Correlation types**: OperationId, TraceId, SpanId, OperationContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{OperationContext, OperationId, SpanId, TraceId};
