//! Request creation

use std::collections::BTreeSet;

use accessgov_core::errors::AccessError;
use accessgov_core::{
    log_op_end, log_op_error, log_op_start, AccessGroup, AccessGroupWithTargets, ApprovalMethod,
    EventType, GroupStatus, GroupTarget, Request, RequestStatus, RequestWithGroupsWithTargets,
    RuleRef, TargetField, TargetKind, Timing,
};
use accessgov_core_types::OperationContext;
use accessgov_store::errors::Result;
use accessgov_store::keys::validate_id;
use accessgov_store::{plan_request_items, CascadePlan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::grants::provision_grants;
use super::{publish, with_context, write_plan, EngineDeps};

/// A new access request as submitted by its requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub requested_by: String,
    pub rule: RuleRef,
    pub timing: Timing,
    pub approval_method: ApprovalMethod,
    pub groups: Vec<NewAccessGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccessGroup {
    /// Defaults to the request's timing
    #[serde(default)]
    pub timing: Option<Timing>,
    #[serde(default)]
    pub reviewer_ids: BTreeSet<String>,
    pub targets: Vec<NewGroupTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGroupTarget {
    pub target_cache_id: String,
    pub target_kind: TargetKind,
    #[serde(default)]
    pub fields: Vec<TargetField>,
}

/// Create a request and persist its whole tree.
///
/// Requests with `ApprovalMethod::Automatic` are approved and provisioned
/// before anything is written.
///
/// # Errors
///
/// - `InvalidInput`: bad identifiers, timing, shape or target fields
/// - `EntityTooLarge`: the tree would not fit in one page of `max_page_size`
/// - `ProviderNotFound`: a target kind has no registered provider
/// - `ValidationFailed` / `ExternalService`: automatic provisioning failed
/// - `PartialBatchWrite` / `Persistence`: the cascade write failed
pub fn request_create(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    input: CreateRequest,
) -> Result<RequestWithGroupsWithTargets> {
    log_op_start!(
        "request_create",
        operation_id = ctx.operation_id.as_str(),
        requested_by = input.requested_by.as_str()
    );
    let start = std::time::Instant::now();

    let result = request_create_impl(deps, ctx, now, input).map_err(|e| {
        let e = with_context(e, ctx);
        log_op_error!(
            "request_create",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "request_create",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = result.request.id.as_str()
    );
    Ok(result)
}

fn request_create_impl(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    input: CreateRequest,
) -> Result<RequestWithGroupsWithTargets> {
    validate(deps, &input)?;

    let mut tree = build_tree(input, now);
    tree.sync_denormalized();

    let item_count = 1 + tree.groups.len() + tree.target_count();
    if item_count > deps.config.max_page_size {
        return Err(AccessError::EntityTooLarge {
            request_id: tree.request.id.clone(),
            page_size: deps.config.max_page_size,
        }
        .into());
    }

    if tree.request.approval_method == ApprovalMethod::Automatic {
        provision_grants(deps.handler, &mut tree, now)?;
        tree.set_status(RequestStatus::Approved, now);
    }

    let written = write_plan(
        deps,
        CascadePlan {
            puts: plan_request_items(&tree)?,
            deletes: Vec::new(),
        },
    )?;
    tracing::debug!(request_id = %tree.request.id, written, "request tree written");

    publish(deps, ctx, EventType::RequestCreated, &tree)?;
    if tree.request.status == RequestStatus::Approved {
        publish(deps, ctx, EventType::RequestApproved, &tree)?;
    }
    Ok(tree)
}

fn invalid(reason: impl Into<String>) -> AccessError {
    AccessError::InvalidRequest {
        reason: reason.into(),
    }
}

fn validate(deps: &EngineDeps<'_>, input: &CreateRequest) -> Result<()> {
    validate_id(&input.requested_by)?;
    validate_id(&input.rule.id)?;
    input.timing.validate()?;

    if input.groups.is_empty() {
        return Err(invalid("a request needs at least one access group").into());
    }
    for (i, group) in input.groups.iter().enumerate() {
        if let Some(timing) = &group.timing {
            timing.validate()?;
        }
        if group.targets.is_empty() {
            return Err(invalid(format!("access group {} has no targets", i)).into());
        }
        for reviewer in &group.reviewer_ids {
            validate_id(reviewer)?;
        }
        for target in &group.targets {
            validate_id(&target.target_cache_id)?;
            deps.registry
                .validate_fields(&target.target_kind, &target.fields)?;
        }
    }

    if input.approval_method == ApprovalMethod::Reviewed
        && input.groups.iter().all(|g| g.reviewer_ids.is_empty())
    {
        return Err(invalid("a reviewed request needs at least one reviewer").into());
    }
    Ok(())
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

fn build_tree(input: CreateRequest, now: DateTime<Utc>) -> RequestWithGroupsWithTargets {
    let request = Request::new(
        new_id(),
        input.requested_by,
        input.rule,
        input.timing,
        input.approval_method,
        now,
    );

    // stored order is id order; return the tree the way it reads back
    let mut groups: Vec<AccessGroupWithTargets> = input
        .groups
        .into_iter()
        .map(|g| {
            let group_id = new_id();
            let mut targets: Vec<GroupTarget> = g
                .targets
                .into_iter()
                .map(|t| GroupTarget {
                    id: new_id(),
                    group_id: group_id.clone(),
                    request_id: request.id.clone(),
                    target_cache_id: t.target_cache_id,
                    target_kind: t.target_kind,
                    fields: t.fields,
                    request_status: request.status,
                    request_reviewer_ids: BTreeSet::new(),
                    grant: None,
                    created_at: now,
                    updated_at: now,
                })
                .collect();
            targets.sort_by(|a, b| a.id.cmp(&b.id));
            AccessGroupWithTargets {
                group: AccessGroup {
                    id: group_id,
                    request_id: request.id.clone(),
                    status: GroupStatus::Pending,
                    request_status: request.status,
                    request_reviewer_ids: BTreeSet::new(),
                    timing: g.timing.unwrap_or(request.requested_timing),
                    override_timing: None,
                    reviewer_ids: g.reviewer_ids,
                    created_at: now,
                    updated_at: now,
                },
                targets,
            }
        })
        .collect();
    groups.sort_by(|a, b| a.group.id.cmp(&b.group.id));

    RequestWithGroupsWithTargets { request, groups }
}
