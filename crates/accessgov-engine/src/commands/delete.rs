//! Request deletion

use accessgov_core::errors::AccessError;
use accessgov_core::{log_op_end, log_op_error, log_op_start, EventType};
use accessgov_core_types::OperationContext;
use accessgov_store::errors::Result;
use accessgov_store::{plan_request_delete, CascadePlan};
use chrono::{DateTime, Utc};

use super::{load_request, publish, with_context, write_plan, EngineDeps};

/// Delete a request, its groups, targets and reviewer associations.
///
/// Returns the number of items removed.
///
/// # Errors
///
/// - `NotFound`: no such request
/// - `InvalidStatus`: the request still holds a live grant; revoke it first
/// - `PartialBatchWrite`: only some items were removed
pub fn request_delete(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    request_id: &str,
) -> Result<usize> {
    log_op_start!(
        "request_delete",
        operation_id = ctx.operation_id.as_str(),
        request_id = request_id
    );
    let start = std::time::Instant::now();

    let result = request_delete_impl(deps, ctx, now, request_id).map_err(|e| {
        let e = with_context(e, ctx);
        log_op_error!(
            "request_delete",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "request_delete",
        duration_ms = start.elapsed().as_millis() as u64,
        item_count = result
    );
    Ok(result)
}

fn request_delete_impl(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    request_id: &str,
) -> Result<usize> {
    let tree = load_request(deps, request_id)?;

    if let Some(grant) = &tree.request.grant {
        if grant.status.is_revocable() && grant.end > now {
            return Err(AccessError::InvalidStatusTransition {
                request_id: request_id.to_string(),
                from: tree.request.status.to_string(),
                to: "DELETED".to_string(),
            }
            .into());
        }
    }

    let deleted = write_plan(
        deps,
        CascadePlan {
            puts: Vec::new(),
            deletes: plan_request_delete(&tree),
        },
    )?;
    publish(deps, ctx, EventType::RequestDeleted, &tree)?;
    Ok(deleted)
}
