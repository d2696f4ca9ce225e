//! Outbound event sink interface

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::errors::{AccessError, Result};

/// Event types published after a state change has been persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "request.created")]
    RequestCreated,
    #[serde(rename = "request.approved")]
    RequestApproved,
    #[serde(rename = "request.declined")]
    RequestDeclined,
    #[serde(rename = "request.cancelled")]
    RequestCancelled,
    #[serde(rename = "request.deleted")]
    RequestDeleted,
    #[serde(rename = "grant.revoked")]
    GrantRevoked,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::RequestCreated => "request.created",
            EventType::RequestApproved => "request.approved",
            EventType::RequestDeclined => "request.declined",
            EventType::RequestCancelled => "request.cancelled",
            EventType::RequestDeleted => "request.deleted",
            EventType::GrantRevoked => "grant.revoked",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publishes lifecycle events.
///
/// Publishing is fire-and-forget for the engine, but a failed publish is
/// returned to whoever triggered the state change.
pub trait EventSink: Send + Sync {
    /// # Errors
    ///
    /// Returns `ExternalService` when the event could not be delivered.
    fn publish(&self, event: EventType, payload: serde_json::Value) -> Result<()>;
}

/// Sink that drops every event.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _: EventType, _: serde_json::Value) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps every published event in memory, in publish order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(EventType, serde_json::Value)>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(EventType, serde_json::Value)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.events().into_iter().map(|(t, _)| t).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: EventType, payload: serde_json::Value) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| AccessError::Internal {
                message: "event recorder lock poisoned".to_string(),
            })?
            .push((event, payload));
        Ok(())
    }
}
