//! Early revocation of approved access

use accessgov_core::errors::AccessError;
use accessgov_core::{
    log_op_end, log_op_error, log_op_start, EventType, RequestStatus,
    RequestWithGroupsWithTargets,
};
use accessgov_core_types::OperationContext;
use accessgov_store::errors::Result;
use accessgov_store::keys::validate_id;
use accessgov_store::plan_request_update;
use chrono::{DateTime, Utc};

use super::grants::revoke_grants;
use super::{load_request, publish, with_context, write_plan, EngineDeps};

/// Revoke the grants of an approved request.
///
/// The request keeps its APPROVED status; its grant becomes REVOKED, which
/// moves the whole tree to its creation time in every time-ordered index.
///
/// # Errors
///
/// - `NotFound`: no such request
/// - `InvalidStatus`: the request is not approved
/// - `InactiveGrant`: the grant is not active or pending, or has ended
/// - `ExternalService`: the access handler failed
pub fn request_revoke(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    request_id: &str,
    revoker_id: &str,
) -> Result<RequestWithGroupsWithTargets> {
    log_op_start!(
        "request_revoke",
        operation_id = ctx.operation_id.as_str(),
        request_id = request_id,
        revoker_id = revoker_id
    );
    let start = std::time::Instant::now();

    let result = request_revoke_impl(deps, ctx, now, request_id, revoker_id).map_err(|e| {
        let e = with_context(e, ctx);
        log_op_error!(
            "request_revoke",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "request_revoke",
        duration_ms = start.elapsed().as_millis() as u64
    );
    Ok(result)
}

fn request_revoke_impl(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    request_id: &str,
    revoker_id: &str,
) -> Result<RequestWithGroupsWithTargets> {
    validate_id(revoker_id)?;
    let mut tree = load_request(deps, request_id)?;
    let previous_reviewers = tree.request.reviewer_ids.clone();

    if tree.request.status != RequestStatus::Approved {
        return Err(AccessError::InvalidStatusTransition {
            request_id: request_id.to_string(),
            from: tree.request.status.to_string(),
            to: "REVOKED".to_string(),
        }
        .into());
    }
    let grant = tree
        .request
        .grant
        .as_ref()
        .ok_or_else(|| AccessError::InvalidRequest {
            reason: format!("request {} has no grant to revoke", request_id),
        })?;
    grant.ensure_revocable(now)?;

    revoke_grants(deps.handler, &mut tree, revoker_id, now)?;
    tree.request.updated_at = now;
    tree.sync_denormalized();

    write_plan(deps, plan_request_update(&tree, &previous_reviewers)?)?;
    publish(deps, ctx, EventType::GrantRevoked, &tree)?;
    Ok(tree)
}
