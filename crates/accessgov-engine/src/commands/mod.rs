//! Command orchestration layer.
//!
//! Every command follows the same shape: load the authoritative tree, apply
//! the transition to it, compute the cascade from the result, batch-write
//! it, then publish. A publish failure is reported after the write has
//! already landed; the write itself is idempotent and may be retried.
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use only `tracing::debug!()` for internal details.

pub mod cancel;
pub mod create;
pub mod delete;
pub mod engine_command;
pub mod engine_query;
pub mod grants;
pub mod review;
pub mod revoke;

use accessgov_core::{
    AccessHandler, EngineConfig, EventSink, EventType, ExError, ProviderRegistry,
    RequestWithGroupsWithTargets,
};
use accessgov_core_types::OperationContext;
use accessgov_store::access::GetRequestWithGroupsWithTargets;
use accessgov_store::errors::Result;
use accessgov_store::{run_all, BatchWriter, CascadePlan, ItemStore, QueryOptions};

/// Collaborators every command needs
#[derive(Clone, Copy)]
pub struct EngineDeps<'a> {
    pub store: &'a dyn ItemStore,
    pub handler: &'a dyn AccessHandler,
    pub events: &'a dyn EventSink,
    pub registry: &'a ProviderRegistry,
    pub config: &'a EngineConfig,
}

/// Read one request tree in full
pub(crate) fn load_request(
    deps: &EngineDeps<'_>,
    request_id: &str,
) -> Result<RequestWithGroupsWithTargets> {
    let mut get = GetRequestWithGroupsWithTargets::new(request_id);
    run_all(
        deps.store,
        &mut get,
        QueryOptions::with_page_size(deps.config.max_page_size),
    )?;
    get.into_result()
}

/// Apply a cascade plan, puts first
pub(crate) fn write_plan(deps: &EngineDeps<'_>, plan: CascadePlan) -> Result<usize> {
    let writer = BatchWriter::new(deps.store).with_chunk_size(deps.config.max_batch_items);
    let written = writer.put_all(plan.puts)?;
    let deleted = writer.delete_all(plan.deletes)?;
    Ok(written + deleted)
}

pub(crate) fn publish(
    deps: &EngineDeps<'_>,
    ctx: &OperationContext,
    event: EventType,
    tree: &RequestWithGroupsWithTargets,
) -> Result<()> {
    let payload = serde_json::json!({
        "operation_id": ctx.operation_id.as_str(),
        "request_id": tree.request.id,
        "status": tree.request.status,
        "request": tree,
    });
    deps.events.publish(event, payload)?;
    Ok(())
}

/// Tag an error with the operation's correlation ids
pub(crate) fn with_context(err: ExError, ctx: &OperationContext) -> ExError {
    let err = err.with_operation_id(ctx.operation_id.clone());
    match &ctx.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}
