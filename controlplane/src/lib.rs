//! Test control plane
//!
//! Brings up the backing processes an integration test environment needs
//! (currently an API server), concurrently, and tears them down again.
//! Process variants plug in through the `ControlPlaneProcess` trait.

pub mod config;
pub mod control_plane;
pub mod error;
pub mod processes;
pub mod state;
pub mod traits;

// Re-export commonly used types
pub use config::ApiServerConfig;
pub use control_plane::ControlPlane;
pub use error::{ControlPlaneError, ControlPlaneResult};
pub use processes::ApiServer;
pub use state::{ControlPlaneStatus, ProcessPhase, ProcessStatus};
pub use traits::{ControlPlaneProcess, MockControlPlaneProcess};
