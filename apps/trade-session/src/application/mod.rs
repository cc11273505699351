//! Application Layer - Use cases and port definitions.
//!
//! Services that keep the session alive and answer the presentation layer,
//! and the gateway port they depend on.

/// Port interfaces for the remote trading gateway.
pub mod ports;

/// Token renewal, instrument resolution and the client facade.
pub mod services;
