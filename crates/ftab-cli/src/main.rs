mod args;
mod logger;
mod render;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use ftab_core::engine::{self, BenchPlan, Executor};
use ftab_core::httpfile::parse_file;
use ftab_core::mock::MockRegistry;
use ftab_core::FtabError;

use crate::args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logging(cli.verbose);

    match run(cli).await {
        Ok(output) => {
            if output.ends_with('\n') {
                print!("{output}");
            } else {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ftab: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, FtabError> {
    let config = cli.to_config();
    config.validate()?;

    let file = parse_file(&cli.input)?;
    tracing::debug!(path = %cli.input.display(), cases = file.len(), "http file parsed");

    let executor = Executor::from_config(&config)?;
    let mocks = MockRegistry::builtin().with_locale(config.mocker.clone());

    if !config.is_benchmark() {
        return Ok(engine::trace(&file, &executor, &mocks).await);
    }

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, stopping after in-flight iterations");
                cancel.cancel();
            }
        }
    });

    let outcome = engine::bench(
        Arc::new(file),
        Arc::new(executor),
        Arc::new(mocks),
        BenchPlan::from_config(&config),
        cancel,
    )
    .await;
    watcher.abort();

    let report = outcome?.report();
    Ok(render::render(&report, cli.output)?)
}
