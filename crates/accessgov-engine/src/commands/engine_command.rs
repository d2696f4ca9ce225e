//! Engine-level state-changing commands.

#![allow(clippy::result_large_err)]

use accessgov_core::RequestWithGroupsWithTargets;
use accessgov_core_types::OperationContext;
use accessgov_store::errors::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::create::{request_create, CreateRequest};
use super::review::{request_review, ReviewDecision};
use super::EngineDeps;

/// Commands that change request state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EngineCommand {
    /// Create a request tree; automatic requests are approved immediately.
    RequestCreate(CreateRequest),
    /// Approve or decline a pending request.
    RequestReview {
        request_id: String,
        reviewer_id: String,
        decision: ReviewDecision,
    },
    /// Withdraw a pending request. Only its requester may do this.
    RequestCancel {
        request_id: String,
        actor_id: String,
    },
    /// End an approved request's access early.
    RequestRevoke {
        request_id: String,
        revoker_id: String,
    },
    RequestDelete { request_id: String },
}

/// Result of applying an engine command.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommandResult {
    /// The request tree as persisted after the command
    Request(Box<RequestWithGroupsWithTargets>),
    Deleted { request_id: String, item_count: usize },
}

impl EngineCommandResult {
    pub fn request(&self) -> Option<&RequestWithGroupsWithTargets> {
        match self {
            EngineCommandResult::Request(tree) => Some(tree),
            EngineCommandResult::Deleted { .. } => None,
        }
    }
}

/// Apply an engine command at `now`.
///
/// # Errors
///
/// Whatever the underlying command returns, tagged with the operation and
/// trace ids from `ctx`.
pub fn apply_engine_command(
    cmd: EngineCommand,
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    now: DateTime<Utc>,
) -> Result<EngineCommandResult> {
    let tree = match cmd {
        EngineCommand::RequestCreate(input) => request_create(deps, ctx, now, input)?,
        EngineCommand::RequestReview {
            request_id,
            reviewer_id,
            decision,
        } => request_review(deps, ctx, now, &request_id, &reviewer_id, decision)?,
        EngineCommand::RequestCancel {
            request_id,
            actor_id,
        } => super::cancel::request_cancel(deps, ctx, now, &request_id, &actor_id)?,
        EngineCommand::RequestRevoke {
            request_id,
            revoker_id,
        } => super::revoke::request_revoke(deps, ctx, now, &request_id, &revoker_id)?,
        EngineCommand::RequestDelete { request_id } => {
            let item_count = super::delete::request_delete(deps, ctx, now, &request_id)?;
            return Ok(EngineCommandResult::Deleted {
                request_id,
                item_count,
            });
        }
    };
    Ok(EngineCommandResult::Request(Box::new(tree)))
}
