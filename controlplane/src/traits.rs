//! Trait definitions with mockall annotations for testing
//!
//! `ControlPlaneProcess` is the only seam between the control plane and the
//! processes it manages. New process variants implement it; the control plane
//! never needs to change to accommodate them.

use crate::error::ControlPlaneResult;

/// Capability set of a process the control plane can manage
#[mockall::automock]
#[async_trait::async_trait]
pub trait ControlPlaneProcess: Send + Sync {
    /// Start the process
    ///
    /// Must not return until the process is ready to serve or has
    /// definitively failed to start. Called at most once per process.
    async fn start(&self) -> ControlPlaneResult<()>;

    /// Stop the process and release its resources
    async fn stop(&self) -> ControlPlaneResult<()>;

    /// Connectable endpoint of a running process
    ///
    /// # Returns
    /// `ControlPlaneError::NotReady` until `start` has returned successfully
    async fn address(&self) -> ControlPlaneResult<String>;
}
