use accessgov_core_types::{OperationId, TraceId};
use thiserror::Error;

use crate::model::GrantStatus;

/// Result type alias using AccessError
pub type Result<T> = std::result::Result<T, AccessError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by the core, the store and the engine is
/// classified into one of these kinds. Each kind maps to a stable error
/// code that callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    ConstraintViolation,
    InvalidCursor,
    InvalidConfig,

    // Lifecycle
    ValidationFailed,
    InactiveGrant,
    InvalidStatus,
    Forbidden,
    ProviderNotFound,

    // Assembly
    /// A single entity's items do not fit into one store page
    EntityTooLarge,

    // Integration
    /// A batched write was only partly applied by the store
    PartialBatchWrite,
    Serialization,
    Persistence,
    ExternalService,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::InvalidCursor => "ERR_INVALID_CURSOR",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::ValidationFailed => "ERR_VALIDATION_FAILED",
            ExErrorKind::InactiveGrant => "ERR_INACTIVE_GRANT",
            ExErrorKind::InvalidStatus => "ERR_INVALID_STATUS",
            ExErrorKind::Forbidden => "ERR_FORBIDDEN",
            ExErrorKind::ProviderNotFound => "ERR_PROVIDER_NOT_FOUND",
            ExErrorKind::EntityTooLarge => "ERR_ENTITY_TOO_LARGE",
            ExErrorKind::PartialBatchWrite => "ERR_PARTIAL_BATCH_WRITE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// context (operation, entity, correlation ids) needed for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    operation_id: Option<OperationId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
    progress: Option<(usize, usize)>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            operation_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
            progress: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add operation ID context
    pub fn with_operation_id(mut self, operation_id: OperationId) -> Self {
        self.operation_id = Some(operation_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Record how many of how many items a batched write applied
    pub fn with_progress(mut self, written: usize, total: usize) -> Self {
        self.progress = Some((written, total));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the operation ID context, if any
    pub fn operation_id(&self) -> Option<&OperationId> {
        self.operation_id.as_ref()
    }

    /// Get the trace ID context, if any
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// `(written, total)` for a partially applied batch
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.progress
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some((written, total)) = self.progress {
            write!(f, " ({} of {} items written)", written, total)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for access-governance operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    // ===== Lookup Errors =====
    #[error("Access request not found: {request_id}")]
    RequestNotFound { request_id: String },

    #[error("Access group {group_id} not found in request {request_id}")]
    GroupNotFound {
        request_id: String,
        group_id: String,
    },

    #[error("Target {target_id} not found in group {group_id} of request {request_id}")]
    TargetNotFound {
        request_id: String,
        group_id: String,
        target_id: String,
    },

    #[error("{reviewer_id} is not a reviewer of request {request_id}")]
    ReviewerNotFound {
        request_id: String,
        reviewer_id: String,
    },

    #[error("No provider registered for target kind {target_kind}")]
    ProviderNotFound { target_kind: String },

    // ===== Validation Errors =====
    #[error("Invalid identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    #[error("Invalid timing: {reason}")]
    InvalidTiming { reason: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Invalid fields for {target_kind}: {reason}")]
    InvalidFields { target_kind: String, reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The access handler rejected the proposed grant
    #[error("Grant validation failed: {reason}")]
    GrantValidationFailed { reason: String },

    // ===== Lifecycle Errors =====
    #[error("Grant for {subject} is not active ({status:?}): {reason}")]
    InactiveGrant {
        subject: String,
        status: GrantStatus,
        reason: String,
    },

    #[error("Request {request_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        request_id: String,
        from: String,
        to: String,
    },

    #[error("{actor_id} may not {action} request {request_id}")]
    Forbidden {
        request_id: String,
        actor_id: String,
        action: String,
    },

    // ===== Assembly Errors =====
    /// Items were supplied but none of them is a request
    #[error("No items to assemble")]
    NoItems,

    #[error("Item {sort_key} has no parent in the assembled slice")]
    OrphanItem { sort_key: String },

    #[error("Unrecognised sort key: {sort_key}")]
    UnrecognisedSortKey { sort_key: String },

    #[error("Request {request_id} expects {expected} group targets but {actual} were stored")]
    GroupTargetCountMismatch {
        request_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Request {request_id} does not fit in one page of {page_size} items")]
    EntityTooLarge { request_id: String, page_size: usize },

    // ===== Collaborator Errors =====
    #[error("{service} failed: {message}")]
    ExternalService { service: String, message: String },

    // ===== Generic Errors =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<AccessError> for ExError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::RequestNotFound { request_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(request_id)
                .with_message("Access request not found"),

            AccessError::GroupNotFound {
                request_id,
                group_id,
            } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(group_id)
                .with_message(format!("Access group not found in request {}", request_id)),

            AccessError::TargetNotFound {
                request_id,
                group_id,
                target_id,
            } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(target_id)
                .with_message(format!(
                    "Target not found in group {} of request {}",
                    group_id, request_id
                )),

            AccessError::ReviewerNotFound {
                request_id,
                reviewer_id,
            } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(request_id)
                .with_message(format!("{} is not a reviewer", reviewer_id)),

            AccessError::ProviderNotFound { target_kind } => {
                ExError::new(ExErrorKind::ProviderNotFound)
                    .with_entity_id(target_kind)
                    .with_message("No provider registered for target kind")
            }

            AccessError::InvalidIdentifier { id, reason } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_entity_id(id)
                    .with_message(format!("Invalid identifier: {}", reason))
            }

            AccessError::InvalidTiming { reason } => ExError::new(ExErrorKind::InvalidInput)
                .with_message(format!("Invalid timing: {}", reason)),

            AccessError::InvalidRequest { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }

            AccessError::InvalidFields {
                target_kind,
                reason,
            } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_id(target_kind)
                .with_message(format!("Invalid fields: {}", reason)),

            AccessError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(reason)
            }

            AccessError::GrantValidationFailed { reason } => {
                ExError::new(ExErrorKind::ValidationFailed).with_message(reason)
            }

            AccessError::InactiveGrant {
                subject,
                status,
                reason,
            } => ExError::new(ExErrorKind::InactiveGrant)
                .with_entity_id(subject)
                .with_message(format!("Grant is {:?}: {}", status, reason)),

            AccessError::InvalidStatusTransition {
                request_id,
                from,
                to,
            } => ExError::new(ExErrorKind::InvalidStatus)
                .with_entity_id(request_id)
                .with_message(format!("Cannot move from {} to {}", from, to)),

            AccessError::Forbidden {
                request_id,
                actor_id,
                action,
            } => ExError::new(ExErrorKind::Forbidden)
                .with_entity_id(request_id)
                .with_message(format!("{} may not {}", actor_id, action)),

            AccessError::NoItems => {
                ExError::new(ExErrorKind::NotFound).with_message("No items to assemble")
            }

            AccessError::OrphanItem { sort_key } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_id(sort_key)
                .with_message("Item has no parent in the assembled slice"),

            AccessError::UnrecognisedSortKey { sort_key } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_entity_id(sort_key)
                    .with_message("Unrecognised sort key")
            }

            AccessError::GroupTargetCountMismatch {
                request_id,
                expected,
                actual,
            } => ExError::new(ExErrorKind::ConstraintViolation)
                .with_entity_id(request_id)
                .with_message(format!(
                    "Expected {} group targets but found {}",
                    expected, actual
                )),

            AccessError::EntityTooLarge {
                request_id,
                page_size,
            } => ExError::new(ExErrorKind::EntityTooLarge)
                .with_entity_id(request_id)
                .with_message(format!(
                    "Request does not fit in one page of {} items",
                    page_size
                )),

            AccessError::ExternalService { service, message } => {
                ExError::new(ExErrorKind::ExternalService)
                    .with_op(service)
                    .with_message(message)
            }

            AccessError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            AccessError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to AccessError
impl From<serde_json::Error> for AccessError {
    fn from(err: serde_json::Error) -> Self {
        AccessError::Serialization {
            message: err.to_string(),
        }
    }
}
