//! Test fixtures and data for control plane tests

use std::time::Duration;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Address the stubbed API server reports
    pub const API_SERVER_URL: &'static str = "http://127.0.0.1:9999";

    /// Canonical start failure reason
    pub const BIND_FAILED: &'static str = "bind failed";

    /// Start delays
    pub const FAST: Duration = Duration::from_millis(10);
    pub const SLOW: Duration = Duration::from_secs(5);

    /// Upper bound for anything that is supposed to return promptly
    pub const PROMPT: Duration = Duration::from_secs(1);

    /// Name of the i-th stub process
    pub fn stub_name(index: usize) -> String {
        format!("stub-{index}")
    }

    /// Address reported by the i-th stub process
    pub fn stub_address(index: usize) -> String {
        format!("http://127.0.0.1:{}", 10_000 + index)
    }
}
