//! Structured logging for access-governance operations
//!
//! - `init(profile)` installs the global subscriber once
//! - `log_op_start!`, `log_op_end!` and `log_op_error!` emit the boundary
//!   events of a command with `component`, `op` and `event` fields
//! - `test_capture` records events in memory for assertions
//!
//! Only the engine emits boundary events. Core and store log at `debug`.
//!
//! ```rust
//! use accessgov_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
