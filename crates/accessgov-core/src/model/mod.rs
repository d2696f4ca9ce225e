pub mod grant;
pub mod group;
pub mod request;
pub mod reviewer;
pub mod target;
pub mod timing;
pub mod tree;

pub use grant::{Grant, GrantStatus};
pub use group::{AccessGroup, GroupStatus};
pub use request::{ApprovalMethod, Request, RequestStatus, RuleRef};
pub use reviewer::Reviewer;
pub use target::{GroupTarget, TargetField, TargetKind};
pub use timing::{max_instant, resolve_interval, Interval, Timing};
pub use tree::{AccessGroupWithTargets, RequestWithGroupsWithTargets};
