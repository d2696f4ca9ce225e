//! Requester cancellation

use accessgov_core::errors::AccessError;
use accessgov_core::{
    log_op_end, log_op_error, log_op_start, EventType, RequestStatus,
    RequestWithGroupsWithTargets,
};
use accessgov_core_types::OperationContext;
use accessgov_store::errors::Result;
use accessgov_store::plan_request_update;
use chrono::{DateTime, Utc};

use super::{load_request, publish, with_context, write_plan, EngineDeps};

/// Cancel a pending request on behalf of its requester.
///
/// Group statuses are left as they were; only the request and its
/// denormalized copies move to CANCELLED.
///
/// # Errors
///
/// - `NotFound`: no such request
/// - `Forbidden`: `actor_id` did not make the request
/// - `InvalidStatus`: the request is no longer pending
pub fn request_cancel(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    request_id: &str,
    actor_id: &str,
) -> Result<RequestWithGroupsWithTargets> {
    log_op_start!(
        "request_cancel",
        operation_id = ctx.operation_id.as_str(),
        request_id = request_id
    );
    let start = std::time::Instant::now();

    let result = request_cancel_impl(deps, ctx, now, request_id, actor_id).map_err(|e| {
        let e = with_context(e, ctx);
        log_op_error!(
            "request_cancel",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "request_cancel",
        duration_ms = start.elapsed().as_millis() as u64
    );
    Ok(result)
}

fn request_cancel_impl(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    request_id: &str,
    actor_id: &str,
) -> Result<RequestWithGroupsWithTargets> {
    let mut tree = load_request(deps, request_id)?;
    let previous_reviewers = tree.request.reviewer_ids.clone();

    if tree.request.requested_by != actor_id {
        return Err(AccessError::Forbidden {
            request_id: request_id.to_string(),
            actor_id: actor_id.to_string(),
            action: "cancel".to_string(),
        }
        .into());
    }
    if tree.request.status != RequestStatus::Pending {
        return Err(AccessError::InvalidStatusTransition {
            request_id: request_id.to_string(),
            from: tree.request.status.to_string(),
            to: RequestStatus::Cancelled.to_string(),
        }
        .into());
    }

    tree.set_status(RequestStatus::Cancelled, now);
    write_plan(deps, plan_request_update(&tree, &previous_reviewers)?)?;
    publish(deps, ctx, EventType::RequestCancelled, &tree)?;
    Ok(tree)
}
