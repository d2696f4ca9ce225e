//! Boundary events for engine commands and queries
//!
//! A command such as `request_review` emits exactly two events: `start` on
//! entry, then either `end` (with `duration_ms` and whatever outcome fields
//! the command adds, e.g. `status` or `item_count`) or `end_error` (with
//! `duration_ms`, `err_kind` and the stable `err_code`). Every event carries
//! `component` (the calling module) and `op` (the command or query name),
//! so a request's history can be followed by filtering on `op` and
//! `operation_id`.

/// Shared shape of every boundary event
#[doc(hidden)]
#[macro_export]
macro_rules! __log_boundary {
    ($level:expr, $event:expr, $op:expr $(, $($field:tt)*)?) => {
        tracing::event!(
            $level,
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// Entry into a command; extra fields identify what it acts on
///
/// ```
/// # use accessgov_core::log_op_start;
/// log_op_start!("request_cancel");
/// log_op_start!("request_cancel", request_id = "r-1", actor_id = "alice");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_boundary!(
            tracing::Level::INFO,
            accessgov_core_types::schema::EVENT_START,
            $op
            $(, $($field)*)?
        )
    };
}

/// Successful completion; `duration_ms` is mandatory
///
/// ```
/// # use accessgov_core::log_op_end;
/// log_op_end!("request_delete", duration_ms = 4, item_count = 9);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_boundary!(
            tracing::Level::INFO,
            accessgov_core_types::schema::EVENT_END,
            $op,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Failed completion. `$err` is anything convertible into `ExError`; its
/// kind and code are logged, never its message.
///
/// ```
/// # use accessgov_core::{log_op_error, errors::AccessError};
/// let err = AccessError::RequestNotFound { request_id: "r-1".to_string() };
/// log_op_error!("request_review", err, duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_boundary!(
            tracing::Level::ERROR,
            accessgov_core_types::schema::EVENT_END_ERROR,
            $op,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
