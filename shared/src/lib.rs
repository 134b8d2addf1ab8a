//! Shared types for the test control plane
//!
//! Contains the process identity used to name managed processes,
//! shared error types and the logging helpers every crate uses.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
