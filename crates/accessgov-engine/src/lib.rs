//! Access governance engine - lifecycle orchestration
//!
//! Commands load a request tree through the store's access patterns, apply a
//! lifecycle transition, call the access handler, write the resulting
//! cascade and publish an event. Queries expose the access patterns with
//! configured page sizes and opaque cursor tokens.

pub mod commands;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::engine_query::{
    apply_engine_query, EngineQuery, EngineQueryResult, ListOptions, Page,
};
pub use commands::EngineDeps;
