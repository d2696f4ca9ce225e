//! Access governance core
//!
//! Domain model for time-bound access requests and everything the storage
//! engine and lifecycle commands share:
//! - Request / AccessGroup / GroupTarget / Grant model and assembled trees
//! - timing resolution and the derived end-time ordering policy
//! - the `ExError` facility and the `AccessError` domain enum
//! - provider registry with optional capabilities
//! - collaborator traits for the access handler and the event sink
//! - configuration and the structured logging facility

pub mod config;
pub mod errors;
pub mod events;
pub mod handler;
pub mod logging_facility;
pub mod model;
pub mod ordering;
pub mod registry;

pub use config::EngineConfig;
pub use errors::{AccessError, ExError, ExErrorKind, Result};
pub use events::{EventSink, EventType, NoopEventSink, RecordingEventSink};
pub use handler::{AccessHandler, GrantSpec};
pub use model::{
    AccessGroup, AccessGroupWithTargets, ApprovalMethod, Grant, GrantStatus, GroupStatus,
    GroupTarget, Interval, Request, RequestStatus, RequestWithGroupsWithTargets, Reviewer,
    RuleRef, TargetField, TargetKind, Timing,
};
pub use ordering::{derived_end_time, is_upcoming};
pub use registry::{Argument, ArgumentSchema, ArgumentSchemaProvider, Provider, ProviderRegistry};
