//! Test helpers and builder patterns for control plane tests
//!
//! `StubProcess` covers timing-dependent behaviour (slow, hung or failing
//! starts) that mockall expectations cannot express; `ControlPlaneBuilder`
//! wires stubs and mocks into a control plane.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use controlplane::*;
use shared::ProcessId;

use super::fixtures::TestFixtures;

/// How a stub's start call ends
#[derive(Debug, Clone)]
pub enum StartBehavior {
    Succeed,
    Fail(String),
    Hang,
}

/// Scriptable process for concurrency tests
pub struct StubProcess {
    id: ProcessId,
    address: String,
    delay: Duration,
    behavior: StartBehavior,
    stop_failure: Option<String>,
    running: Mutex<bool>,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    stop_log: Option<Arc<Mutex<Vec<String>>>>,
}

impl StubProcess {
    /// Stub that starts successfully after a short delay
    pub fn new(index: usize) -> Self {
        Self {
            id: ProcessId::Named(TestFixtures::stub_name(index)),
            address: TestFixtures::stub_address(index),
            delay: TestFixtures::FAST,
            behavior: StartBehavior::Succeed,
            stop_failure: None,
            running: Mutex::new(false),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            stop_log: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.behavior = StartBehavior::Fail(reason.to_string());
        self
    }

    pub fn hanging(mut self) -> Self {
        self.behavior = StartBehavior::Hang;
        self
    }

    pub fn failing_stop(mut self, reason: &str) -> Self {
        self.stop_failure = Some(reason.to_string());
        self
    }

    /// Record stop calls into a log shared with other stubs
    pub fn with_stop_log(mut self, stop_log: Arc<Mutex<Vec<String>>>) -> Self {
        self.stop_log = Some(stop_log);
        self
    }

    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock().unwrap()
    }
}

#[async_trait]
impl ControlPlaneProcess for StubProcess {
    async fn start(&self) -> ControlPlaneResult<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        match &self.behavior {
            StartBehavior::Succeed => {
                *self.running.lock().unwrap() = true;
                Ok(())
            }
            StartBehavior::Fail(reason) => Err(ControlPlaneError::start(&self.id, reason)),
            StartBehavior::Hang => std::future::pending::<ControlPlaneResult<()>>().await,
        }
    }

    async fn stop(&self) -> ControlPlaneResult<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.stop_log {
            log.lock().unwrap().push(self.name().to_string());
        }

        if let Some(reason) = &self.stop_failure {
            return Err(ControlPlaneError::stop(&self.id, reason));
        }
        *self.running.lock().unwrap() = false;
        Ok(())
    }

    async fn address(&self) -> ControlPlaneResult<String> {
        if self.is_running() {
            Ok(self.address.clone())
        } else {
            Err(ControlPlaneError::not_ready(&self.id))
        }
    }
}

/// Builder for control planes over stubs and mocks
#[derive(Default)]
pub struct ControlPlaneBuilder {
    processes: Vec<(ProcessId, Arc<dyn ControlPlaneProcess>)>,
}

impl ControlPlaneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stub, keeping a handle for later inspection
    pub fn with_stub(mut self, stub: &Arc<StubProcess>) -> Self {
        let process: Arc<dyn ControlPlaneProcess> = stub.clone();
        self.processes.push((stub.id().clone(), process));
        self
    }

    /// Add a mock API server configured by `setup`
    pub fn with_api_server_mock<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockControlPlaneProcess),
    {
        let mut mock = MockControlPlaneProcess::new();
        setup(&mut mock);
        let process: Arc<dyn ControlPlaneProcess> = Arc::new(mock);
        self.processes.push((ProcessId::ApiServer, process));
        self
    }

    pub fn build(self) -> ControlPlane {
        ControlPlane::with_processes(self.processes).expect("unique process names")
    }
}

/// Helper functions for common test operations
pub struct TestHelpers;

impl TestHelpers {
    /// `count` stubs that all start successfully
    pub fn healthy_stubs(count: usize) -> Vec<Arc<StubProcess>> {
        (0..count).map(|i| Arc::new(StubProcess::new(i))).collect()
    }

    /// Control plane over the given stubs, in order
    pub fn control_plane(stubs: &[Arc<StubProcess>]) -> ControlPlane {
        stubs
            .iter()
            .fold(ControlPlaneBuilder::new(), |builder, stub| builder.with_stub(stub))
            .build()
    }

    /// Control plane with one API server mock that starts, reports
    /// `TestFixtures::API_SERVER_URL` and stops successfully
    pub fn healthy_api_server() -> ControlPlane {
        ControlPlaneBuilder::new()
            .with_api_server_mock(|mock| {
                mock.expect_start().times(1).returning(|| Ok(()));
                mock.expect_address()
                    .returning(|| Ok(TestFixtures::API_SERVER_URL.to_string()));
                mock.expect_stop().times(1).returning(|| Ok(()));
            })
            .build()
    }

    /// Control plane with one API server mock whose start fails to bind
    pub fn failing_api_server() -> ControlPlane {
        ControlPlaneBuilder::new()
            .with_api_server_mock(|mock| {
                mock.expect_start().times(1).returning(|| {
                    Err(ControlPlaneError::start(
                        &ProcessId::ApiServer,
                        TestFixtures::BIND_FAILED,
                    ))
                });
                mock.expect_address().never();
                mock.expect_stop().returning(|| Ok(()));
            })
            .build()
    }

    /// Assert every stub is reachable through the control plane
    pub async fn assert_all_addresses(control_plane: &ControlPlane, stubs: &[Arc<StubProcess>]) {
        for (index, stub) in stubs.iter().enumerate() {
            let address = control_plane.address_of(stub.name()).await.unwrap();
            assert_eq!(address, TestFixtures::stub_address(index));
        }
    }
}
