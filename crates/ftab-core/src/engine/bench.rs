use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::BenchConfig;
use crate::engine::executor::Executor;
use crate::engine::rate::RateGate;
use crate::engine::report::{report, Report, Stat};
use crate::error::FtabError;
use crate::httpfile::HttpFile;
use crate::mock::MockRegistry;

/// Shape of a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchPlan {
    /// Number of concurrent workers.
    pub connections: usize,
    /// Total iterations, split evenly across workers. The remainder of the
    /// division is not run.
    pub requests: usize,
    /// Iterations per second across all workers.
    pub rate_limit: Option<u64>,
    /// Log every failed iteration at warn level instead of debug.
    pub verbose: bool,
}

impl BenchPlan {
    pub fn from_config(config: &BenchConfig) -> Self {
        Self {
            connections: config.connections,
            requests: config.requests,
            rate_limit: config.rate_limit,
            verbose: config.verbose,
        }
    }

    pub fn iterations_per_worker(&self) -> usize {
        self.requests.checked_div(self.connections).unwrap_or(0)
    }
}

/// Everything a finished (or cancelled) run produced.
#[derive(Debug, Clone)]
pub struct BenchOutcome {
    pub stats: Vec<Stat>,
    /// Wall-clock time from the first worker start until every worker finished.
    pub elapsed: Duration,
    /// Workers that signalled completion.
    pub finished_workers: usize,
    pub connections: usize,
}

impl BenchOutcome {
    /// Aggregate the stats, with the run's connection count as concurrency.
    pub fn report(self) -> Report {
        let mut r = report(self.stats, self.elapsed);
        r.concurrency = self.connections;
        r
    }
}

enum WorkerEvent {
    Stat(Stat),
    Done,
}

/// Run `file` repeatedly on `plan.connections` concurrent workers.
///
/// Every iteration executes a fresh mocked, statically expanded duplicate and
/// yields exactly one [`Stat`]; failed iterations are counted, never retried.
/// Cancelling `cancel` stops each worker before its next iteration and the
/// stats collected so far are returned.
pub async fn bench(
    file: Arc<HttpFile>,
    executor: Arc<Executor>,
    mocks: Arc<MockRegistry>,
    plan: BenchPlan,
    cancel: CancellationToken,
) -> Result<BenchOutcome, FtabError> {
    if plan.connections == 0 {
        return Err(FtabError::Validation(
            "connections must be greater than zero".to_string(),
        ));
    }
    if plan.rate_limit == Some(0) {
        return Err(FtabError::Validation(
            "rate limit must be greater than zero".to_string(),
        ));
    }

    let iterations = plan.iterations_per_worker();
    tracing::info!(
        connections = plan.connections,
        iterations_per_worker = iterations,
        rate_limit = ?plan.rate_limit,
        "benchmark started"
    );

    let gate = plan.rate_limit.map(|rate| Arc::new(RateGate::new(rate)));
    let (tx, mut rx) = mpsc::channel::<WorkerEvent>(1024);
    let mut workers: JoinSet<()> = JoinSet::new();

    let start = Instant::now();
    for worker in 0..plan.connections {
        workers.spawn(run_worker(
            worker,
            iterations,
            Arc::clone(&file),
            Arc::clone(&executor),
            Arc::clone(&mocks),
            gate.clone(),
            plan.verbose,
            cancel.clone(),
            tx.clone(),
        ));
    }
    // The channel closes once every worker has dropped its sender.
    drop(tx);

    let expected = iterations.saturating_mul(plan.connections);
    let mut stats = Vec::with_capacity(expected.min(1 << 20));
    let mut finished_workers = 0;
    while finished_workers < plan.connections {
        match rx.recv().await {
            Some(WorkerEvent::Stat(stat)) => stats.push(stat),
            Some(WorkerEvent::Done) => finished_workers += 1,
            None => break,
        }
    }
    let elapsed = start.elapsed();

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "benchmark worker failed");
        }
    }

    tracing::info!(
        iterations = stats.len(),
        finished_workers,
        elapsed_ms = elapsed.as_millis() as u64,
        "benchmark finished"
    );

    Ok(BenchOutcome {
        stats,
        elapsed,
        finished_workers,
        connections: plan.connections,
    })
}

#[allow(clippy::too_many_arguments)]
async fn run_worker(
    worker: usize,
    iterations: usize,
    file: Arc<HttpFile>,
    executor: Arc<Executor>,
    mocks: Arc<MockRegistry>,
    gate: Option<Arc<RateGate>>,
    verbose: bool,
    cancel: CancellationToken,
    tx: mpsc::Sender<WorkerEvent>,
) {
    for _ in 0..iterations {
        if cancel.is_cancelled() {
            break;
        }
        if let Some(gate) = &gate {
            tokio::select! {
                acquired = gate.acquire() => {
                    if acquired.is_err() {
                        break;
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }

        let mut run = file.duplicate(Some(mocks.as_ref()), true);
        let result = executor.execute(&mut run, &[]).await;
        if let Err(e) = &result {
            if verbose {
                tracing::warn!(worker, error = %e, "iteration failed");
            } else {
                tracing::debug!(worker, error = %e, "iteration failed");
            }
        }

        let stat = Stat::from_run(&run, result.is_ok());
        if tx.send(WorkerEvent::Stat(stat)).await.is_err() {
            break;
        }
        if run.auto_release() {
            run.release();
        }
    }
    let _ = tx.send(WorkerEvent::Done).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
