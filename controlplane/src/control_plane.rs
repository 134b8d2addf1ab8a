//! Control plane orchestration
//!
//! Owns a fixed, ordered set of managed processes. `start` launches every
//! process concurrently and returns once all are ready or as soon as the
//! first one fails. `stop` tears them down one by one in declaration order.
//!
//! A failed `start` does not stop the processes that did come up; call
//! `stop` to clean them up. `stop` first waits for any start still in flight
//! on a process, so cleanup after a failed `start` covers late starters too.
//! Neither operation applies a timeout of its own, so a process whose `start`
//! never returns blocks `start`, and later `stop`, indefinitely.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use shared::{logging, process_debug, process_error, process_warn, ProcessId};

use crate::{
    config::ApiServerConfig,
    error::{ControlPlaneError, ControlPlaneResult},
    processes::ApiServer,
    state::{ControlPlaneStatus, ProcessPhase, ProcessStatus},
    traits::ControlPlaneProcess,
};

/// One managed process and its lifecycle phase
struct ManagedProcess {
    id: ProcessId,
    process: Arc<dyn ControlPlaneProcess>,
    /// Written only by whoever is currently starting or stopping this process
    phase: Arc<Mutex<ProcessPhase>>,
    /// Start task, kept until `stop` has waited for it
    start_task: Option<JoinHandle<()>>,
}

impl ManagedProcess {
    fn new(id: ProcessId, process: Arc<dyn ControlPlaneProcess>) -> Self {
        Self {
            id,
            process,
            phase: Arc::new(Mutex::new(ProcessPhase::NotStarted)),
            start_task: None,
        }
    }
}

/// Test control plane: the backing processes integration tests run against
pub struct ControlPlane {
    processes: Vec<ManagedProcess>,
}

impl ControlPlane {
    /// Control plane with an API server configured from the environment
    pub fn new() -> ControlPlaneResult<Self> {
        Self::from_config(ApiServerConfig::from_env()?)
    }

    /// Control plane with an API server using `config`
    pub fn from_config(config: ApiServerConfig) -> ControlPlaneResult<Self> {
        let api_server: Arc<dyn ControlPlaneProcess> = Arc::new(ApiServer::new(config)?);
        Self::with_processes(vec![(ProcessId::ApiServer, api_server)])
    }

    /// Control plane over explicitly provided processes
    ///
    /// Processes are started concurrently and stopped in the order given.
    /// Names must be unique; `Named("APIServer")` is the API server's name.
    pub fn with_processes(processes: Vec<(ProcessId, Arc<dyn ControlPlaneProcess>)>) -> ControlPlaneResult<Self> {
        let mut managed: Vec<ManagedProcess> = Vec::with_capacity(processes.len());

        for (id, process) in processes {
            let id = ProcessId::from_name(id.as_str());
            if managed.iter().any(|m| m.id == id) {
                return Err(ControlPlaneError::DuplicateProcess { name: id.to_string() });
            }
            managed.push(ManagedProcess::new(id, process));
        }

        Ok(Self { processes: managed })
    }

    /// Start every managed process concurrently
    ///
    /// Returns once every process reported ready, or with the first error
    /// observed in completion order. Starts still in flight at that point keep
    /// running in the background and their outcomes are discarded.
    pub async fn start(&mut self) -> ControlPlaneResult<()> {
        for managed in &self.processes {
            let phase = *managed.phase.lock().await;
            if phase != ProcessPhase::NotStarted {
                return Err(ControlPlaneError::invalid_state(format!(
                    "{} is already {}",
                    managed.id, phase
                )));
            }
        }

        let count = self.processes.len();
        logging::log_startup(&ProcessId::ControlPlane, &format!("{count} control plane process(es)"));

        // One slot per process so no starter ever waits on the reader
        let (started_tx, mut started_rx) = mpsc::channel(count.max(1));

        for managed in &mut self.processes {
            let id = managed.id.clone();
            let process = Arc::clone(&managed.process);
            let phase = Arc::clone(&managed.phase);
            let started_tx = started_tx.clone();

            managed.start_task = Some(tokio::spawn(async move {
                let result = process.start().await;
                {
                    let mut phase = phase.lock().await;
                    // A stop that got here first owns the phase
                    if *phase == ProcessPhase::NotStarted {
                        *phase = ProcessPhase::after_start(result.is_ok());
                    }
                }
                // Receiver is gone if another process already failed
                let _ = started_tx.send((id, result)).await;
            }));
        }
        drop(started_tx);

        for _ in 0..count {
            match started_rx.recv().await {
                Some((id, Ok(()))) => {
                    process_debug!(ProcessId::ControlPlane, "🟢 {} is running", id);
                }
                Some((id, Err(e))) => {
                    process_error!(ProcessId::ControlPlane, "❌ {} failed to start: {}", id, e);
                    return Err(e);
                }
                None => {
                    return Err(ControlPlaneError::invalid_state(
                        "a start task ended without reporting an outcome",
                    ));
                }
            }
        }

        logging::log_success(&ProcessId::ControlPlane, "Control plane is ready");
        Ok(())
    }

    /// Stop every managed process in declaration order
    ///
    /// Each process's outstanding start, if any, is awaited before that
    /// process is stopped. The first failure is returned and the remaining
    /// processes are left untouched.
    pub async fn stop(&mut self) -> ControlPlaneResult<()> {
        logging::log_shutdown(&ProcessId::ControlPlane, "stopping control plane processes");

        for managed in &mut self.processes {
            if let Some(start_task) = managed.start_task.take() {
                if let Err(e) = start_task.await {
                    process_warn!(ProcessId::ControlPlane, "⚠️ Start task for {} did not finish: {}", managed.id, e);
                }
            }

            let result = managed.process.stop().await;

            let mut phase = managed.phase.lock().await;
            *phase = phase.after_stop(result.is_ok());

            if let Err(e) = result {
                logging::log_error(&managed.id, "Stop", &e);
                return Err(e);
            }
            process_debug!(ProcessId::ControlPlane, "🛑 {} stopped", managed.id);
        }

        Ok(())
    }

    /// Endpoint of the named process
    ///
    /// # Returns
    /// `NotReady` unless the process has been started successfully
    pub async fn address_of(&self, name: &str) -> ControlPlaneResult<String> {
        let managed = self.find(name)?;

        if !managed.phase.lock().await.is_running() {
            return Err(ControlPlaneError::not_ready(&managed.id));
        }
        managed.process.address().await
    }

    /// Endpoint clients use to connect to the API server
    pub async fn api_server_url(&self) -> ControlPlaneResult<String> {
        self.address_of(ProcessId::ApiServer.as_str()).await
    }

    /// Current phase of the named process
    pub async fn phase_of(&self, name: &str) -> ControlPlaneResult<ProcessPhase> {
        let managed = self.find(name)?;
        let phase = *managed.phase.lock().await;
        Ok(phase)
    }

    /// Snapshot of every managed process
    pub async fn status(&self) -> ControlPlaneStatus {
        let mut processes = Vec::with_capacity(self.processes.len());
        for managed in &self.processes {
            processes.push(ProcessStatus {
                name: managed.id.clone(),
                phase: *managed.phase.lock().await,
            });
        }
        ControlPlaneStatus::new(processes)
    }

    /// True once every managed process is running
    pub async fn is_ready(&self) -> bool {
        self.status().await.ready
    }

    pub fn process_names(&self) -> Vec<&ProcessId> {
        self.processes.iter().map(|m| &m.id).collect()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    fn find(&self, name: &str) -> ControlPlaneResult<&ManagedProcess> {
        self.processes
            .iter()
            .find(|m| m.id.as_str() == name)
            .ok_or_else(|| ControlPlaneError::UnknownProcess { name: name.to_string() })
    }
}
