use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use ftab_core::config::BenchConfig;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    Plain,
    Json,
}

/// Benchmark HTTP APIs described by `.http` request files.
///
/// With `-n` greater than 1 the file is run repeatedly and a report is
/// printed; otherwise it runs once and the full exchange is printed.
#[derive(Debug, Parser)]
#[command(name = "ftab", version, about)]
pub struct Cli {
    /// Request file to run.
    #[arg(short = 'i', long = "in", env = "FTAB_IN", default_value = "test.http")]
    pub input: PathBuf,

    /// Concurrent connections (workers).
    #[arg(short = 'c', long, env = "FTAB_CONNECTIONS", default_value_t = 1, value_parser = parse_positive_usize)]
    pub connections: usize,

    /// Total iterations across all connections.
    #[arg(short = 'n', long, env = "FTAB_REQUESTS", default_value_t = 1)]
    pub requests: usize,

    /// Iterations per second across all connections.
    #[arg(short = 'r', long = "rate", env = "FTAB_RATE", value_parser = parse_positive_u64)]
    pub rate: Option<u64>,

    /// Report format.
    #[arg(short = 'm', long = "output", env = "FTAB_OUTPUT", value_enum, default_value_t = OutputFormat::Human)]
    pub output: OutputFormat,

    /// Status code every case must return.
    #[arg(long = "expect-status", env = "FTAB_EXPECT_STATUS", default_value_t = 200)]
    pub expect_status: u16,

    /// Locale of generated fake data.
    #[arg(long, env = "FTAB_MOCKER", default_value = "cn")]
    pub mocker: String,

    /// Per-request timeout in milliseconds.
    #[arg(long = "timeout-ms", env = "FTAB_TIMEOUT_MS", default_value_t = 1000, value_parser = parse_positive_u64)]
    pub timeout_ms: u64,

    /// Debug logging.
    #[arg(short, long, env = "FTAB_VERBOSE")]
    pub verbose: bool,
}

impl Cli {
    pub fn to_config(&self) -> BenchConfig {
        BenchConfig {
            connections: self.connections,
            requests: self.requests,
            rate_limit: self.rate,
            expected_status: self.expect_status,
            mocker: self.mocker.clone(),
            timeout_ms: self.timeout_ms,
            verbose: self.verbose,
            ..BenchConfig::default()
        }
    }
}

fn parse_positive_usize(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_positive_u64(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_single_run() {
        let cli = Cli::try_parse_from(["ftab"]).expect("defaults parse");
        assert_eq!(cli.input, PathBuf::from("test.http"));
        assert_eq!(cli.output, OutputFormat::Human);

        let config = cli.to_config();
        assert_eq!(config.connections, 1);
        assert_eq!(config.requests, 1);
        assert_eq!(config.expected_status, 200);
        assert!(!config.is_benchmark());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn short_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "ftab", "-i", "api.http", "-c", "8", "-n", "1000", "-r", "50", "-m", "json", "-v",
        ])
        .expect("flags parse");
        assert_eq!(cli.input, PathBuf::from("api.http"));
        assert_eq!(cli.output, OutputFormat::Json);

        let config = cli.to_config();
        assert_eq!(config.connections, 8);
        assert_eq!(config.requests, 1000);
        assert_eq!(config.rate_limit, Some(50));
        assert!(config.verbose);
        assert!(config.is_benchmark());
    }

    #[test]
    fn long_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "ftab",
            "--expect-status",
            "201",
            "--mocker",
            "us",
            "--timeout-ms",
            "250",
            "--output",
            "plain",
        ])
        .expect("flags parse");
        let config = cli.to_config();
        assert_eq!(config.expected_status, 201);
        assert_eq!(config.mocker, "us");
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(cli.output, OutputFormat::Plain);
    }

    #[test]
    fn zero_connections_and_rate_are_rejected() {
        assert!(Cli::try_parse_from(["ftab", "-c", "0"]).is_err());
        assert!(Cli::try_parse_from(["ftab", "-r", "0"]).is_err());
        assert!(Cli::try_parse_from(["ftab", "-m", "xml"]).is_err());
    }
}
