use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use accessgov_core::errors::AccessError;
use accessgov_core::{
    AccessHandler, ApprovalMethod, Argument, ArgumentSchema, ArgumentSchemaProvider,
    EngineConfig, EventSink, EventType, Grant, GrantSpec, GrantStatus, Provider,
    ProviderRegistry, RecordingEventSink, RuleRef, TargetField, TargetKind, Timing,
};
use accessgov_engine::commands::create::{CreateRequest, NewAccessGroup, NewGroupTarget};
use accessgov_engine::EngineDeps;
use accessgov_store::{ItemStore, MemoryStore};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// 2022-01-01 at `h:m` UTC
#[allow(dead_code)]
pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 1, 1, h, m, 0).unwrap()
}

#[allow(dead_code)]
pub fn aws_kind() -> TargetKind {
    TargetKind::new("acme", "aws", "Account")
}

/// Kind whose provider has no argument schema
#[allow(dead_code)]
pub fn okta_kind() -> TargetKind {
    TargetKind::new("acme", "okta", "Group")
}

#[allow(dead_code)]
pub fn account_field(value: &str) -> TargetField {
    TargetField {
        id: "accountId".to_string(),
        label: "Account".to_string(),
        value: value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Access handler that records every call and returns ACTIVE grants
#[derive(Default)]
pub struct FakeHandler {
    pub calls: Mutex<Vec<String>>,
    pub reject_validation: AtomicBool,
    pub fail_create: AtomicBool,
}

#[allow(dead_code)]
impl FakeHandler {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AccessHandler for FakeHandler {
    fn create_grant(&self, spec: &GrantSpec) -> accessgov_core::Result<Grant> {
        self.record(format!("create:{}", spec.subject));
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AccessError::ExternalService {
                service: "fake-handler".to_string(),
                message: "provisioning unavailable".to_string(),
            });
        }
        Ok(Grant {
            id: spec.id.clone(),
            provider: spec.provider.clone(),
            subject: spec.subject.clone(),
            start: spec.start,
            end: spec.end,
            status: GrantStatus::Active,
            parameters: spec.parameters.clone(),
            revoked_by: None,
        })
    }

    fn revoke_grant(&self, grant: &Grant, revoker_id: &str) -> accessgov_core::Result<Grant> {
        self.record(format!("revoke:{}", grant.id));
        Ok(Grant {
            status: GrantStatus::Revoked,
            revoked_by: Some(revoker_id.to_string()),
            ..grant.clone()
        })
    }

    fn validate_grant(&self, spec: &GrantSpec) -> accessgov_core::Result<()> {
        self.record(format!("validate:{}", spec.subject));
        if self.reject_validation.load(Ordering::SeqCst) {
            return Err(AccessError::GrantValidationFailed {
                reason: "account is suspended".to_string(),
            });
        }
        Ok(())
    }
}

/// Sink that refuses every event
pub struct FailingSink;

impl EventSink for FailingSink {
    fn publish(&self, _: EventType, _: serde_json::Value) -> accessgov_core::Result<()> {
        Err(AccessError::ExternalService {
            service: "events".to_string(),
            message: "bus unavailable".to_string(),
        })
    }
}

struct SchemaProvider(TargetKind);

impl Provider for SchemaProvider {
    fn kind(&self) -> &TargetKind {
        &self.0
    }

    fn argument_schema_provider(&self) -> Option<&dyn ArgumentSchemaProvider> {
        Some(self)
    }
}

impl ArgumentSchemaProvider for SchemaProvider {
    fn argument_schema(&self) -> ArgumentSchema {
        ArgumentSchema::default().with_argument(Argument {
            id: "accountId".to_string(),
            title: "Account".to_string(),
            required: true,
            allowed_values: Some(
                ["111", "222"].into_iter().map(String::from).collect(),
            ),
        })
    }
}

struct PlainProvider(TargetKind);

impl Provider for PlainProvider {
    fn kind(&self) -> &TargetKind {
        &self.0
    }
}

/// aws (schema: required accountId in {111, 222}) and okta (no schema)
#[allow(dead_code)]
pub fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(SchemaProvider(aws_kind())));
    registry.register(Arc::new(PlainProvider(okta_kind())));
    registry
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Everything a command needs, owned in one place
pub struct Harness<S: ItemStore = MemoryStore> {
    pub store: S,
    pub handler: FakeHandler,
    pub events: RecordingEventSink,
    pub registry: ProviderRegistry,
    pub config: EngineConfig,
}

#[allow(dead_code)]
impl Harness<MemoryStore> {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

#[allow(dead_code)]
impl<S: ItemStore> Harness<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            handler: FakeHandler::default(),
            events: RecordingEventSink::new(),
            registry: registry(),
            config: EngineConfig {
                max_page_size: 20,
                max_batch_items: 4,
                ..EngineConfig::default()
            },
        }
    }

    pub fn deps(&self) -> EngineDeps<'_> {
        EngineDeps {
            store: &self.store,
            handler: &self.handler,
            events: &self.events,
            registry: &self.registry,
            config: &self.config,
        }
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.events.events().into_iter().map(|(t, _)| t).collect()
    }
}

/// A request by `user` starting at 10:00 for an hour.
///
/// Group `i` has `shape[i]` aws targets and reviewer `rev-{i}`.
#[allow(dead_code)]
pub fn create_input(user: &str, method: ApprovalMethod, shape: &[usize]) -> CreateRequest {
    CreateRequest {
        requested_by: user.to_string(),
        rule: RuleRef {
            id: "rule-1".to_string(),
            version: "v1".to_string(),
        },
        timing: Timing::scheduled(at(10, 0), Duration::hours(1)),
        approval_method: method,
        groups: shape
            .iter()
            .enumerate()
            .map(|(gi, n)| NewAccessGroup {
                timing: None,
                reviewer_ids: [format!("rev-{}", gi)].into_iter().collect::<BTreeSet<_>>(),
                targets: (0..*n)
                    .map(|ti| NewGroupTarget {
                        target_cache_id: format!("cache-{}-{}", gi, ti),
                        target_kind: aws_kind(),
                        fields: vec![account_field("111")],
                    })
                    .collect(),
            })
            .collect(),
    }
}
