//! Domain Layer - Core session and trading types.
//!
//! Pure types and rules with no I/O: credential decoding, the instrument
//! table, and the view models returned to the presentation layer.

/// Access token and claim decoding.
pub mod credential;

/// Instrument resolution table and security index.
pub mod instrument;

/// Trading view models and pre-submission rules.
pub mod trading;
