use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::httpfile::HttpFile;

// ---------------------------------------------------------------------------
// Stat
// ---------------------------------------------------------------------------

/// Outcome of one benchmark iteration (one execution of a whole file).
///
/// Exactly one of `succeeded` / `failed` is 1. Byte and time totals cover
/// every case that completed in the iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Stat {
    pub requests: u64,
    /// Seconds spent in request round trips, summed over cases.
    pub time_consumed: f64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl Stat {
    /// Summarise an executed file.
    pub fn from_run(file: &HttpFile, success: bool) -> Self {
        let mut stat = Stat {
            requests: 1,
            succeeded: u64::from(success),
            failed: u64::from(!success),
            ..Stat::default()
        };
        for case in file.cases() {
            stat.bytes_sent += case.request_size().unwrap_or(0);
            stat.bytes_received += case.response_size().unwrap_or(0);
            stat.time_consumed += case.elapsed().map_or(0.0, |d| d.as_secs_f64());
        }
        stat
    }

    pub fn is_success(&self) -> bool {
        self.succeeded > 0
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Aggregate view of a benchmark run. Times are seconds, rates are per second.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Report {
    pub total_requests: u64,
    pub concurrency: usize,
    pub succeeded: u64,
    pub failed: u64,
    pub total_sent: u64,
    pub total_received: u64,
    pub total_time: f64,
    pub send_rate: f64,
    pub recv_rate: f64,
    pub avg_time: f64,
    pub requests_per_second: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub p50_time: f64,
    pub p75_time: f64,
    pub p90_time: f64,
    pub p95_time: f64,
    pub p99_time: f64,
    /// Every iteration, ascending by `time_consumed`.
    pub stats: Vec<Stat>,
}

/// Nearest-rank index for fraction `p` of `n` sorted samples:
/// `floor(n * p)` clamped to the last sample.
pub fn percentile_index(n: usize, p: f64) -> usize {
    let idx = (n as f64 * p).floor() as usize;
    idx.min(n.saturating_sub(1))
}

fn per_second(total: f64, secs: f64) -> f64 {
    if secs > 0.0 {
        total / secs
    } else {
        0.0
    }
}

/// Reduce a run's stats. Latency figures cover successful iterations only;
/// failed ones still count towards totals. `concurrency` is left for the
/// caller to fill in.
pub fn report(mut stats: Vec<Stat>, elapsed: Duration) -> Report {
    if stats.is_empty() {
        return Report::default();
    }

    stats.sort_by(|a, b| a.time_consumed.total_cmp(&b.time_consumed));

    let mut r = Report {
        total_time: elapsed.as_secs_f64(),
        ..Report::default()
    };
    let mut success_time = 0.0;
    for stat in &stats {
        r.total_requests += stat.requests;
        r.succeeded += stat.succeeded;
        r.failed += stat.failed;
        r.total_sent += stat.bytes_sent;
        r.total_received += stat.bytes_received;
        if stat.is_success() {
            success_time += stat.time_consumed;
        }
    }

    r.send_rate = per_second(r.total_sent as f64, r.total_time);
    r.recv_rate = per_second(r.total_received as f64, r.total_time);
    r.requests_per_second = per_second(r.succeeded as f64, r.total_time);
    if r.succeeded > 0 {
        r.avg_time = success_time / r.succeeded as f64;
    }

    let latencies: Vec<f64> = stats
        .iter()
        .filter(|s| s.is_success())
        .map(|s| s.time_consumed)
        .collect();
    if let (Some(first), Some(last)) = (latencies.first(), latencies.last()) {
        let n = latencies.len();
        r.min_time = *first;
        r.max_time = *last;
        r.p50_time = latencies[percentile_index(n, 0.50)];
        r.p75_time = latencies[percentile_index(n, 0.75)];
        r.p90_time = latencies[percentile_index(n, 0.90)];
        r.p95_time = latencies[percentile_index(n, 0.95)];
        r.p99_time = latencies[percentile_index(n, 0.99)];
    }

    r.stats = stats;
    r
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
