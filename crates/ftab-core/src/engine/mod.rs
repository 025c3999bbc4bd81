//! Running request files: single sequential runs, the concurrent benchmark
//! harness and the statistics it reports.

pub mod bench;
pub mod executor;
pub mod rate;
pub mod report;
pub mod trace;

pub use bench::{bench, BenchOutcome, BenchPlan};
pub use executor::Executor;
pub use rate::RateGate;
pub use report::{percentile_index, report, Report, Stat};
pub use trace::{render_trace, trace};
