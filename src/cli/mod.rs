// CLI module
// Command-line interface and argument parsing

mod args;

pub use args::{CliArgs, StoreKind};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// Each option may also come from its environment variable (`REDIS_HOST`,
/// `REDIS_PORT`, `BIND_ADDR`, `RUST_LOG`). On invalid arguments or `--help`,
/// clap prints the message and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
