//! Account store backends
//!
//! - `redis_store` - Production backend over a pooled Redis connection set
//! - `memory_store` - In-process backend with the same watch semantics, used
//!   by tests, benchmarks and `--store memory`

#[cfg(test)]
pub(crate) mod contended;
pub mod memory_store;
pub mod redis_store;

pub use memory_store::{MemoryStore, MemoryTransaction};
pub use redis_store::{parse_balance, RedisStore, RedisTransaction};
