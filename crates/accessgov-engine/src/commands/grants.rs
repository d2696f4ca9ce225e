//! Grant provisioning and revocation against the access handler

use accessgov_core::{AccessHandler, GrantSpec, RequestWithGroupsWithTargets};
use accessgov_store::errors::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Provision one grant per target over its group's effective interval.
///
/// Every grant is validated before the first one is created, so a rejected
/// target leaves the handler untouched. Recomputes the request-level grant
/// afterwards.
///
/// # Errors
///
/// Returns `ValidationFailed` when the handler rejects a grant and
/// `ExternalService` when provisioning fails.
pub fn provision_grants(
    handler: &dyn AccessHandler,
    tree: &mut RequestWithGroupsWithTargets,
    now: DateTime<Utc>,
) -> Result<usize> {
    let subject = tree.request.requested_by.clone();
    let mut specs = Vec::with_capacity(tree.target_count());
    for g in &tree.groups {
        let interval = g.group.interval(now);
        for t in &g.targets {
            let spec = GrantSpec {
                id: Uuid::now_v7().to_string(),
                provider: t.target_kind.to_string(),
                subject: subject.clone(),
                start: interval.start,
                end: interval.end,
                parameters: t.parameters(),
            };
            handler.validate_grant(&spec)?;
            specs.push(spec);
        }
    }

    let mut specs = specs.into_iter();
    let mut created = 0;
    for t in tree.targets_mut() {
        let Some(spec) = specs.next() else { break };
        t.grant = Some(handler.create_grant(&spec)?);
        t.updated_at = now;
        created += 1;
    }
    tree.derive_request_grant();
    tracing::debug!(request_id = %tree.request.id, created, "grants provisioned");
    Ok(created)
}

/// Revoke every active or pending target grant, returning how many were
/// revoked. Recomputes the request-level grant afterwards.
///
/// # Errors
///
/// Returns `ExternalService` when the handler fails.
pub fn revoke_grants(
    handler: &dyn AccessHandler,
    tree: &mut RequestWithGroupsWithTargets,
    revoker_id: &str,
    now: DateTime<Utc>,
) -> Result<usize> {
    let mut revoked = 0;
    for t in tree.targets_mut() {
        let updated = match &t.grant {
            Some(grant) if grant.status.is_revocable() => handler.revoke_grant(grant, revoker_id)?,
            _ => continue,
        };
        t.grant = Some(updated);
        t.updated_at = now;
        revoked += 1;
    }
    tree.derive_request_grant();
    tracing::debug!(request_id = %tree.request.id, revoked, "grants revoked");
    Ok(revoked)
}
