//! Process identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a managed process, or of the control plane itself
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// The orchestrating control plane
    ControlPlane,
    /// The API server backing process
    ApiServer,
    /// Any other injected process variant
    Named(String),
}

impl ProcessId {
    /// Name used for lookups and log output
    pub fn as_str(&self) -> &str {
        match self {
            ProcessId::ControlPlane => "ControlPlane",
            ProcessId::ApiServer => "APIServer",
            ProcessId::Named(name) => name,
        }
    }

    /// Map a name back onto a well-known id where possible
    pub fn from_name(name: &str) -> Self {
        match name {
            "ControlPlane" => ProcessId::ControlPlane,
            "APIServer" => ProcessId::ApiServer,
            other => ProcessId::Named(other.to_string()),
        }
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
