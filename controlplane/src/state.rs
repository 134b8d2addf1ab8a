//! Lifecycle phases and status snapshots for managed processes

use serde::{Deserialize, Serialize};
use shared::ProcessId;
use std::fmt;

/// Lifecycle phase of a single managed process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessPhase {
    NotStarted,
    Running,
    Stopped,
    Failed,
}

impl ProcessPhase {
    /// Phase after a start attempt finished
    pub fn after_start(succeeded: bool) -> Self {
        if succeeded {
            ProcessPhase::Running
        } else {
            ProcessPhase::Failed
        }
    }

    /// Phase after a stop attempt finished
    ///
    /// A failed stop leaves the process in an indeterminate state, which is
    /// reported as `Failed`.
    pub fn after_stop(self, succeeded: bool) -> Self {
        match (self, succeeded) {
            (ProcessPhase::Failed, _) => ProcessPhase::Failed,
            (_, true) => ProcessPhase::Stopped,
            (_, false) => ProcessPhase::Failed,
        }
    }

    pub fn is_running(self) -> bool {
        self == ProcessPhase::Running
    }
}

impl fmt::Display for ProcessPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessPhase::NotStarted => "not-started",
            ProcessPhase::Running => "running",
            ProcessPhase::Stopped => "stopped",
            ProcessPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Phase of one named process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStatus {
    pub name: ProcessId,
    pub phase: ProcessPhase,
}

/// Snapshot of every managed process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlaneStatus {
    pub processes: Vec<ProcessStatus>,
    pub ready: bool,
}

impl ControlPlaneStatus {
    pub fn new(processes: Vec<ProcessStatus>) -> Self {
        let ready = !processes.is_empty() && processes.iter().all(|p| p.phase.is_running());
        Self { processes, ready }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_is_absorbing() {
        assert_eq!(ProcessPhase::Failed.after_stop(true), ProcessPhase::Failed);
        assert_eq!(ProcessPhase::Failed.after_stop(false), ProcessPhase::Failed);
    }

    #[test]
    fn test_stop_transitions() {
        assert_eq!(ProcessPhase::Running.after_stop(true), ProcessPhase::Stopped);
        assert_eq!(ProcessPhase::Running.after_stop(false), ProcessPhase::Failed);
        assert_eq!(ProcessPhase::NotStarted.after_stop(true), ProcessPhase::Stopped);
    }

    #[test]
    fn test_ready_requires_every_process_running() {
        let running = ProcessStatus {
            name: ProcessId::ApiServer,
            phase: ProcessPhase::Running,
        };
        let failed = ProcessStatus {
            name: ProcessId::Named("Etcd".to_string()),
            phase: ProcessPhase::Failed,
        };

        assert!(ControlPlaneStatus::new(vec![running.clone()]).ready);
        assert!(!ControlPlaneStatus::new(vec![running, failed]).ready);
        assert!(!ControlPlaneStatus::new(vec![]).ready);
    }

    #[test]
    fn test_status_serializes_phases() {
        let status = ControlPlaneStatus::new(vec![ProcessStatus {
            name: ProcessId::ApiServer,
            phase: ProcessPhase::Running,
        }]);
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"Running\""));
        assert!(json.contains("\"ready\":true"));
    }
}
