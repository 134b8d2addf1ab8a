//! API server process configuration
//!
//! Defaults target a locally installed `kube-apiserver`. Environment variables
//! override the defaults, and the fluent setters override both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use shared::{SharedError, SharedResult};

/// Environment variable naming the API server binary
pub const APISERVER_BIN_ENV: &str = "TEST_ASSET_KUBE_APISERVER";
/// Environment variable overriding the start timeout, in seconds
pub const START_TIMEOUT_ENV: &str = "CONTROLPLANE_START_TIMEOUT_SECS";
/// Environment variable overriding the stop timeout, in seconds
pub const STOP_TIMEOUT_ENV: &str = "CONTROLPLANE_STOP_TIMEOUT_SECS";

const DEFAULT_BINARY: &str = "kube-apiserver";
const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_READY_MESSAGE: &str = "Serving insecurely on 127.0.0.1:{port}";

/// Placeholder replaced with the allocated port
pub const PORT_PLACEHOLDER: &str = "{port}";
/// Placeholder replaced with the private data directory
pub const DATA_DIR_PLACEHOLDER: &str = "{data_dir}";

/// Configuration for the API server process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiServerConfig {
    /// Binary to execute
    pub binary_path: PathBuf,
    /// Argument templates, `{port}` and `{data_dir}` are substituted
    pub args: Vec<String>,
    /// Output line marking the server as ready, same placeholders as `args`
    pub ready_message: String,
    /// Upper bound on waiting for the ready message
    pub start_timeout: Duration,
    /// Grace period between SIGTERM and kill
    pub stop_timeout: Duration,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from(DEFAULT_BINARY),
            args: vec![
                format!("--insecure-port={PORT_PLACEHOLDER}"),
                "--insecure-bind-address=127.0.0.1".to_string(),
                format!("--cert-dir={DATA_DIR_PLACEHOLDER}"),
            ],
            ready_message: DEFAULT_READY_MESSAGE.to_string(),
            start_timeout: DEFAULT_START_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

impl ApiServerConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> SharedResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> SharedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(binary) = lookup(APISERVER_BIN_ENV).filter(|v| !v.is_empty()) {
            config.binary_path = PathBuf::from(binary);
        }
        if let Some(raw) = lookup(START_TIMEOUT_ENV) {
            config.start_timeout = parse_secs(START_TIMEOUT_ENV, &raw)?;
        }
        if let Some(raw) = lookup(STOP_TIMEOUT_ENV) {
            config.stop_timeout = parse_secs(STOP_TIMEOUT_ENV, &raw)?;
        }

        Ok(config)
    }

    /// Configure binary path (fluent API)
    pub fn with_binary(mut self, binary_path: impl Into<PathBuf>) -> Self {
        self.binary_path = binary_path.into();
        self
    }

    /// Configure argument templates (fluent API)
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Configure ready message template (fluent API)
    pub fn with_ready_message(mut self, ready_message: impl Into<String>) -> Self {
        self.ready_message = ready_message.into();
        self
    }

    /// Configure start timeout (fluent API)
    pub fn with_start_timeout(mut self, start_timeout: Duration) -> Self {
        self.start_timeout = start_timeout;
        self
    }

    /// Configure stop timeout (fluent API)
    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    /// Arguments with placeholders filled in
    pub fn render_args(&self, port: u16, data_dir: &Path) -> Vec<String> {
        self.args.iter().map(|arg| render(arg, port, data_dir)).collect()
    }

    /// Ready message with placeholders filled in
    pub fn render_ready_message(&self, port: u16, data_dir: &Path) -> String {
        render(&self.ready_message, port, data_dir)
    }
}

fn render(template: &str, port: u16, data_dir: &Path) -> String {
    template
        .replace(PORT_PLACEHOLDER, &port.to_string())
        .replace(DATA_DIR_PLACEHOLDER, &data_dir.to_string_lossy())
}

fn parse_secs(field: &str, raw: &str) -> SharedResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| SharedError::invalid_config(field, raw))
}
