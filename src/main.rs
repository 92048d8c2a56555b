//! Balance Guard server
//!
//! HTTP service that charges and resets account balances stored in Redis.
//!
//! # Usage
//!
//! ```bash
//! cargo run
//! REDIS_HOST=cache.internal REDIS_PORT=6380 cargo run
//! cargo run -- --store memory --bind 127.0.0.1:8080
//! cargo run -- --charge-timeout-ms 5000 --retry-base-ms 20 --log-level balance_guard=debug
//! ```
//!
//! # Exit Codes
//!
//! - 0: Clean shutdown (Ctrl-C)
//! - 1: Startup or server error

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use balance_guard::cli::{self, CliArgs, StoreKind};
use balance_guard::{build_app, AccountService, AccountStore, MemoryStore, RedisStore, RetryConfig};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::parse_args();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.worker_threads())
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let retry = args.to_retry_config();

    match args.store {
        StoreKind::Redis => {
            let url = args.redis_url();
            info!(url = %url, pool_size = args.pool_size(), "Using redis URL");
            let store = RedisStore::connect(&url, args.pool_size())
                .context("failed to configure redis store")?;
            serve(store, retry, args.bind).await
        }
        StoreKind::Memory => {
            info!("Using process-local memory store");
            serve(MemoryStore::new(), retry, args.bind).await
        }
    }
}

async fn serve<S: AccountStore + 'static>(
    store: S,
    retry: RetryConfig,
    addr: SocketAddr,
) -> Result<()> {
    let service = Arc::new(AccountService::new(Arc::new(store), retry));
    let app = build_app(service);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind http listener")?;

    info!(
        addr = %addr,
        deadline_ms = retry.deadline.as_millis() as u64,
        "HTTP server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed
        std::future::pending::<()>().await;
    }
}
