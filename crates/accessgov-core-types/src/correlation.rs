//! Correlation types for operation tracking and tracing
//!
//! An `OperationId` names one engine call (create, review, revoke, ...). It is
//! deliberately not called "request id": in this system a request is the
//! access request being governed, and the two must never be confused in logs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generate a new random id using UUIDv7
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Get the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wrap an id received from a caller
            pub fn from_string(s: String) -> Self {
                Self(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

correlation_id!(
    /// Unique identifier for a single engine operation
    OperationId
);

correlation_id!(
    /// Trace identifier for distributed tracing across service boundaries
    TraceId
);

correlation_id!(
    /// Span identifier for hierarchical tracing within a trace
    SpanId
);

/// Context carried through operation boundaries for correlation
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub operation_id: OperationId,
    pub trace_id: Option<TraceId>,
}

impl OperationContext {
    /// Create a new context with a fresh OperationId
    pub fn new() -> Self {
        Self {
            operation_id: OperationId::new(),
            trace_id: None,
        }
    }

    /// Create a context with an existing OperationId
    pub fn with_operation_id(operation_id: OperationId) -> Self {
        Self {
            operation_id,
            trace_id: None,
        }
    }

    /// Add a TraceId to the context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Trace id as a string, empty when the caller supplied none
    pub fn trace_str(&self) -> &str {
        self.trace_id.as_ref().map(TraceId::as_str).unwrap_or("")
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}
