//! Configuration for the opsgate gateway.
//!
//! Config is read once at process startup and never reloaded: the schema
//! lives in `schema.rs`, file discovery and parsing in `loader.rs`, and
//! `${ENV_VAR}` substitution in `env.rs`. CLI flags override file values at
//! the call site; nothing here writes config back to disk.

pub mod env;
pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::{GatewaySection, OpsgateConfig},
};
