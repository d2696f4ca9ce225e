//! Schema migrations
//!
//! - embedded SQL, applied in order
//! - a `schema_version` ledger with SHA-256 checksums
//! - idempotent: applied migrations are skipped after their checksum is
//!   verified

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
