//! Reviewer decisions on pending requests

use accessgov_core::errors::AccessError;
use accessgov_core::{
    log_op_end, log_op_error, log_op_start, EventType, RequestStatus,
    RequestWithGroupsWithTargets, Timing,
};
use accessgov_core_types::OperationContext;
use accessgov_store::errors::Result;
use accessgov_store::plan_request_update;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::grants::provision_grants;
use super::{load_request, publish, with_context, write_plan, EngineDeps};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Approve, optionally replacing the requested timing for every group
    Approve {
        #[serde(default)]
        override_timing: Option<Timing>,
    },
    Decline,
}

impl ReviewDecision {
    fn target_status(&self) -> RequestStatus {
        match self {
            ReviewDecision::Approve { .. } => RequestStatus::Approved,
            ReviewDecision::Decline => RequestStatus::Declined,
        }
    }
}

/// Approve or decline a pending request.
///
/// Approval provisions one grant per target through the access handler
/// before the new status is written.
///
/// # Errors
///
/// - `NotFound`: no such request
/// - `InvalidStatus`: the request is no longer pending
/// - `Forbidden`: the reviewer is not on the request, or is its requester
/// - `InvalidInput`: the override timing is invalid
/// - `ValidationFailed` / `ExternalService`: provisioning failed
pub fn request_review(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    request_id: &str,
    reviewer_id: &str,
    decision: ReviewDecision,
) -> Result<RequestWithGroupsWithTargets> {
    log_op_start!(
        "request_review",
        operation_id = ctx.operation_id.as_str(),
        request_id = request_id,
        reviewer_id = reviewer_id
    );
    let start = std::time::Instant::now();

    let result =
        request_review_impl(deps, ctx, now, request_id, reviewer_id, decision).map_err(|e| {
            let e = with_context(e, ctx);
            log_op_error!(
                "request_review",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "request_review",
        duration_ms = start.elapsed().as_millis() as u64,
        status = result.request.status.as_str()
    );
    Ok(result)
}

fn request_review_impl(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
    request_id: &str,
    reviewer_id: &str,
    decision: ReviewDecision,
) -> Result<RequestWithGroupsWithTargets> {
    let mut tree = load_request(deps, request_id)?;
    let previous_reviewers = tree.request.reviewer_ids.clone();
    let target = decision.target_status();

    if tree.request.status != RequestStatus::Pending {
        return Err(AccessError::InvalidStatusTransition {
            request_id: request_id.to_string(),
            from: tree.request.status.to_string(),
            to: target.to_string(),
        }
        .into());
    }
    if !tree.request.reviewer_ids.contains(reviewer_id) || reviewer_id == tree.request.requested_by
    {
        return Err(AccessError::Forbidden {
            request_id: request_id.to_string(),
            actor_id: reviewer_id.to_string(),
            action: "review".to_string(),
        }
        .into());
    }

    let event = match decision {
        ReviewDecision::Approve { override_timing } => {
            if let Some(timing) = override_timing {
                timing.validate()?;
                tree.request.override_timing = Some(timing);
                for g in &mut tree.groups {
                    g.group.override_timing = Some(timing);
                }
            }
            provision_grants(deps.handler, &mut tree, now)?;
            EventType::RequestApproved
        }
        ReviewDecision::Decline => EventType::RequestDeclined,
    };
    tree.set_status(target, now);

    write_plan(deps, plan_request_update(&tree, &previous_reviewers)?)?;
    publish(deps, ctx, event, &tree)?;
    Ok(tree)
}
