//! Execution-time parameters handed to the engine by an external driver.

use serde::{Deserialize, Serialize};

use crate::error::FtabError;

/// Settings for a single run or a benchmark run.
///
/// Every field has a default so partial configurations (for example a JSON
/// document carrying only `connections` and `requests`) deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BenchConfig {
    /// Number of concurrent workers.
    pub connections: usize,
    /// Total iterations across all workers; divided evenly, remainder dropped.
    pub requests: usize,
    /// Optional shared cap on iterations started per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u64>,
    /// The only status code a case may return without failing the run.
    pub expected_status: u16,
    /// Locale key used to pick the fake-data generator.
    pub mocker: String,
    /// Per-request client timeout in milliseconds.
    pub timeout_ms: u64,
    pub max_idle_per_host: usize,
    pub verbose: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            connections: 1,
            requests: 1,
            rate_limit: None,
            expected_status: 200,
            mocker: "cn".to_string(),
            timeout_ms: 1000,
            max_idle_per_host: 2048,
            verbose: false,
        }
    }
}

impl BenchConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), FtabError> {
        if self.connections == 0 {
            return Err(FtabError::Validation(
                "connections must be at least 1".to_string(),
            ));
        }
        if !(100..=599).contains(&self.expected_status) {
            return Err(FtabError::Validation(format!(
                "expected status {} is not a valid HTTP status code",
                self.expected_status
            )));
        }
        if self.rate_limit == Some(0) {
            return Err(FtabError::Validation(
                "rate limit must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// `true` when the driver should benchmark rather than run the file once.
    pub fn is_benchmark(&self) -> bool {
        self.requests > 1
    }
}
