//! Process variants
//!
//! Concrete `ControlPlaneProcess` implementations that spawn real binaries.

pub mod api_server;
pub mod output;

pub use api_server::ApiServer;
