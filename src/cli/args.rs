use crate::core::RetryConfig;
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

/// Serve race-free account charges over HTTP
#[derive(Parser, Debug)]
#[command(name = "balance-guard")]
#[command(about = "Serve race-free account charges over HTTP", long_about = None)]
pub struct CliArgs {
    /// Redis host
    #[arg(
        long = "redis-host",
        env = "REDIS_HOST",
        value_name = "HOST",
        default_value = "localhost"
    )]
    pub redis_host: String,

    /// Redis port
    #[arg(
        long = "redis-port",
        env = "REDIS_PORT",
        value_name = "PORT",
        default_value_t = 6379
    )]
    pub redis_port: u16,

    /// Address the HTTP server listens on
    #[arg(
        long = "bind",
        env = "BIND_ADDR",
        value_name = "ADDR",
        default_value = "0.0.0.0:3000"
    )]
    pub bind: SocketAddr,

    /// Account store backend
    #[arg(
        long = "store",
        value_name = "STORE",
        default_value = "redis",
        help = "Store backend: 'redis' for a shared redis server or 'memory' for a process-local store"
    )]
    pub store: StoreKind,

    /// Maximum pooled redis connections
    #[arg(
        long = "pool-size",
        value_name = "COUNT",
        help = "Maximum pooled redis connections (default: 4 per CPU core)"
    )]
    pub pool_size: Option<usize>,

    /// Runtime worker threads
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Runtime worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Total time a charge may spend retrying conflicts
    #[arg(long = "charge-timeout-ms", value_name = "MS", default_value_t = 2000)]
    pub charge_timeout_ms: u64,

    /// Wait before the first conflict retry
    #[arg(long = "retry-base-ms", value_name = "MS", default_value_t = 50)]
    pub retry_base_ms: u64,

    /// Multiplier applied to the wait after each retry
    #[arg(long = "retry-factor", value_name = "FACTOR", default_value_t = 1.6)]
    pub retry_factor: f64,

    /// Log filter directive (e.g. "info", "balance_guard=debug")
    #[arg(
        long = "log-level",
        env = "RUST_LOG",
        value_name = "FILTER",
        default_value = "info"
    )]
    pub log_level: String,
}

/// Available account store backends
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl CliArgs {
    /// Connection URL for the configured redis server
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }

    /// Create a RetryConfig from CLI arguments
    ///
    /// Invalid values fall back to the defaults (see [`RetryConfig::new`]).
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            Duration::from_millis(self.retry_base_ms),
            self.retry_factor,
            Duration::from_millis(self.charge_timeout_ms),
        )
    }

    /// Pool size, falling back to 4 connections per CPU core when unset or zero
    pub fn pool_size(&self) -> usize {
        match self.pool_size {
            Some(size) if size > 0 => size,
            _ => num_cpus::get() * 4,
        }
    }

    /// Worker thread count, falling back to the CPU core count when unset or zero
    pub fn worker_threads(&self) -> usize {
        match self.workers {
            Some(workers) if workers > 0 => workers,
            _ => num_cpus::get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // Store parsing tests
    #[rstest]
    #[case::default_store(&["program"], StoreKind::Redis)]
    #[case::explicit_redis(&["program", "--store", "redis"], StoreKind::Redis)]
    #[case::explicit_memory(&["program", "--store", "memory"], StoreKind::Memory)]
    fn test_store_parsing(#[case] args: &[&str], #[case] expected: StoreKind) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.store, expected);
    }

    #[rstest]
    #[case::host_and_port(
        &["program", "--redis-host", "cache.internal", "--redis-port", "6380"],
        "redis://cache.internal:6380"
    )]
    #[case::ip(
        &["program", "--redis-host", "10.0.0.7", "--redis-port", "6379"],
        "redis://10.0.0.7:6379"
    )]
    fn test_redis_url(#[case] args: &[&str], #[case] expected: &str) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.redis_url(), expected);
    }

    // RetryConfig conversion tests
    #[rstest]
    #[case::defaults(&["program"], RetryConfig::default())]
    #[case::custom(
        &["program", "--charge-timeout-ms", "500", "--retry-base-ms", "10", "--retry-factor", "2"],
        RetryConfig {
            base_delay: Duration::from_millis(10),
            backoff_factor: 2.0,
            deadline: Duration::from_millis(500),
        }
    )]
    #[case::zero_timeout_falls_back(&["program", "--charge-timeout-ms", "0"], RetryConfig::default())]
    #[case::shrinking_factor_falls_back(&["program", "--retry-factor", "0.5"], RetryConfig::default())]
    fn test_retry_config_conversion(#[case] args: &[&str], #[case] expected: RetryConfig) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.to_retry_config(), expected);
    }

    // Zero values should fall back to defaults
    #[rstest]
    #[case::unset(&["program"], num_cpus::get() * 4, num_cpus::get())]
    #[case::zero(&["program", "--pool-size", "0", "--workers", "0"], num_cpus::get() * 4, num_cpus::get())]
    #[case::custom(&["program", "--pool-size", "32", "--workers", "2"], 32, 2)]
    fn test_resource_sizing(
        #[case] args: &[&str],
        #[case] expected_pool: usize,
        #[case] expected_workers: usize,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.pool_size(), expected_pool);
        assert_eq!(parsed.worker_threads(), expected_workers);
    }

    // Error handling tests
    #[rstest]
    #[case::invalid_store(&["program", "--store", "postgres"])]
    #[case::invalid_port(&["program", "--redis-port", "70000"])]
    #[case::invalid_bind(&["program", "--bind", "not-an-address"])]
    #[case::invalid_timeout(&["program", "--charge-timeout-ms", "-1"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
