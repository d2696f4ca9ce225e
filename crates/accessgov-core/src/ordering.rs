//! Derived end-time ordering policy
//!
//! Every time-ordered index key is built from the instant returned here. This
//! is the only place where a request's business status decides where it
//! sorts, so the key codec must call it on every (re)write.

use chrono::{DateTime, Utc};

use crate::model::{max_instant, Grant, RequestStatus, Timing};

/// Instant used to place a request in time-ordered indexes.
///
/// - APPROVED/PENDING with a grant that is neither REVOKED nor ERROR: the
///   grant's end.
/// - APPROVED/PENDING without a grant, scheduled timing: the resolved end.
/// - APPROVED/PENDING without a grant, ASAP timing: [`max_instant`], so the
///   request sorts as upcoming until provisioning fixes its window.
/// - anything else (DECLINED, CANCELLED, REVOKED/ERROR grant): `created_at`.
///
/// `override_timing` supersedes `timing` when present.
pub fn derived_end_time(
    status: RequestStatus,
    grant: Option<&Grant>,
    timing: &Timing,
    override_timing: Option<&Timing>,
    created_at: DateTime<Utc>,
) -> DateTime<Utc> {
    if !matches!(status, RequestStatus::Approved | RequestStatus::Pending) {
        return created_at;
    }
    match grant {
        Some(g) if g.is_usable() => g.end,
        Some(_) => created_at,
        None => {
            let effective = override_timing.unwrap_or(timing);
            if effective.is_scheduled() {
                // now is ignored for scheduled timing
                effective.interval(created_at).end
            } else {
                max_instant()
            }
        }
    }
}

/// Upcoming means the end instant lies strictly after `now`
pub fn is_upcoming(end_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    end_time > now
}
