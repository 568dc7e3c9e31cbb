//! Gateway: the single HTTP entry point for the ops console UI.
//!
//! Lifecycle:
//! 1. Load + apply config (listen address, supervisor URL, static root)
//! 2. Build immutable shared state (one reqwest client, 60 s timeout)
//! 3. Bind the listener, serve the router (health, run proxy, static UI)
//!
//! The supervisor and the services behind it (model server, tool servers)
//! are external collaborators started by deployment tooling. The gateway
//! forwards `/api/run` bodies verbatim in both directions and never
//! interprets the payload.

pub mod proxy;
pub mod server;
pub mod state;
