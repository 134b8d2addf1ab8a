//! Common test utilities and infrastructure
//!
//! Shared fixtures, stub processes and builders used across the control
//! plane test suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{ControlPlaneBuilder, StubProcess, TestHelpers};
