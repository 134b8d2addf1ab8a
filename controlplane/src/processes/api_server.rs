//! API server process
//!
//! Runs the configured API server binary on a freshly allocated loopback port
//! with a private data directory, and reports it ready once the binary prints
//! its ready message.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use url::Url;

use crate::config::ApiServerConfig;
use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::processes::output::{spawn_output_consumers, wait_for_ready, ReadyOutcome};
use crate::traits::ControlPlaneProcess;
use shared::{process_debug, process_info, process_warn, ProcessId, SharedError};

/// API server managed by the control plane
pub struct ApiServer {
    id: ProcessId,
    config: ApiServerConfig,
    port: u16,
    url: String,
    data_path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    state: ServerState,
    data_dir: Option<TempDir>,
}

enum ServerState {
    NotStarted,
    Running(Child),
    Stopped,
    Failed,
}

impl ApiServer {
    /// Allocate a data directory and a port for a new API server
    ///
    /// Nothing is spawned until `start` is called.
    pub fn new(config: ApiServerConfig) -> ControlPlaneResult<Self> {
        let id = ProcessId::ApiServer;

        let data_dir = tempfile::Builder::new()
            .prefix("apiserver-")
            .tempdir()
            .map_err(|e| ControlPlaneError::construction(&id, format!("cannot allocate data directory: {e}")))?;

        let port = allocate_port().map_err(|e| ControlPlaneError::construction(&id, format!("cannot allocate port: {e}")))?;
        let url = endpoint_for(port)?;
        let data_path = data_dir.path().to_path_buf();

        process_debug!(id, "📁 Allocated port {} and data directory {}", port, data_path.display());

        Ok(Self {
            id,
            config,
            port,
            url,
            data_path,
            inner: Mutex::new(Inner {
                state: ServerState::NotStarted,
                data_dir: Some(data_dir),
            }),
        })
    }

    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_path
    }

    pub fn config(&self) -> &ApiServerConfig {
        &self.config
    }

    fn spawn(&self) -> ControlPlaneResult<Child> {
        let args = self.config.render_args(self.port, &self.data_path);

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            ControlPlaneError::start(
                &self.id,
                format!("cannot spawn {}: {e}", self.config.binary_path.display()),
            )
        })?;

        process_debug!(
            self.id,
            "🌐 Spawned {} (PID: {}) with args {:?}",
            self.config.binary_path.display(),
            child.id().unwrap_or(0),
            args
        );

        Ok(child)
    }

    /// SIGTERM, wait for the grace period, then kill
    async fn terminate(&self, child: &mut Child) -> ControlPlaneResult<()> {
        request_shutdown(child);

        match tokio::time::timeout(self.config.stop_timeout, child.wait()).await {
            Ok(Ok(status)) => {
                process_debug!(self.id, "Process exited with {}", status);
                Ok(())
            }
            Ok(Err(e)) => Err(ControlPlaneError::stop(&self.id, e)),
            Err(_) => {
                process_warn!(
                    self.id,
                    "⚠️ Still running {:?} after SIGTERM, killing",
                    self.config.stop_timeout
                );
                child.kill().await.map_err(|e| ControlPlaneError::stop(&self.id, e))
            }
        }
    }
}

#[async_trait]
impl ControlPlaneProcess for ApiServer {
    async fn start(&self) -> ControlPlaneResult<()> {
        let mut inner = self.inner.lock().await;
        if !matches!(inner.state, ServerState::NotStarted) {
            return Err(ControlPlaneError::start(&self.id, "already started"));
        }

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                inner.state = ServerState::Failed;
                return Err(e);
            }
        };

        let ready_message = self.config.render_ready_message(self.port, &self.data_path);
        let mut lines = spawn_output_consumers(&mut child, &self.id);

        match wait_for_ready(&mut lines, &ready_message, self.config.start_timeout).await {
            ReadyOutcome::Ready => {
                inner.state = ServerState::Running(child);
                process_info!(self.id, "✅ Ready at {}", self.url);
                Ok(())
            }
            ReadyOutcome::Exited => {
                let _ = child.start_kill();
                let status = child
                    .wait()
                    .await
                    .map(|s| s.to_string())
                    .unwrap_or_else(|e| e.to_string());
                inner.state = ServerState::Failed;
                Err(ControlPlaneError::start(
                    &self.id,
                    format!("exited before becoming ready ({status})"),
                ))
            }
            ReadyOutcome::TimedOut => {
                let _ = child.kill().await;
                inner.state = ServerState::Failed;
                Err(ControlPlaneError::start(
                    &self.id,
                    format!("not ready after {:?}", self.config.start_timeout),
                ))
            }
        }
    }

    async fn stop(&self) -> ControlPlaneResult<()> {
        let mut inner = self.inner.lock().await;

        let previous = std::mem::replace(&mut inner.state, ServerState::Stopped);
        match previous {
            ServerState::Running(mut child) => {
                if let Err(e) = self.terminate(&mut child).await {
                    inner.state = ServerState::Failed;
                    return Err(e);
                }
                process_info!(self.id, "🛑 Stopped");
            }
            ServerState::Failed => inner.state = ServerState::Failed,
            ServerState::NotStarted | ServerState::Stopped => {}
        }

        if let Some(data_dir) = inner.data_dir.take() {
            data_dir.close().map_err(|e| {
                ControlPlaneError::stop(&self.id, format!("cannot remove data directory: {e}"))
            })?;
        }

        Ok(())
    }

    async fn address(&self) -> ControlPlaneResult<String> {
        match self.inner.lock().await.state {
            ServerState::Running(_) => Ok(self.url.clone()),
            _ => Err(ControlPlaneError::not_ready(&self.id)),
        }
    }
}

/// Ask the OS for a free loopback port
fn allocate_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

fn endpoint_for(port: u16) -> ControlPlaneResult<String> {
    let raw = format!("http://127.0.0.1:{port}");
    let url = Url::parse(&raw).map_err(|_| SharedError::InvalidUrl { input: raw })?;
    Ok(url.origin().ascii_serialization())
}

#[cfg(unix)]
fn request_shutdown(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match child.id().map(i32::try_from) {
        Some(Ok(pid)) => {
            let _ = kill(Pid::from_raw(pid), Signal::SIGTERM);
        }
        // Already reaped, or a pid the signal API cannot express
        _ => {
            let _ = child.start_kill();
        }
    }
}

#[cfg(not(unix))]
fn request_shutdown(child: &mut Child) {
    let _ = child.start_kill();
}
