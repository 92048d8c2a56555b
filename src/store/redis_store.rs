//! Redis-backed account store
//!
//! Balances are stored as decimal strings. Optimistic transactions map onto
//! `WATCH` / `MULTI` / `EXEC`: a nil `EXEC` reply means a watched key changed
//! and nothing was written.
//!
//! # Sessions
//!
//! Each transaction checks a dedicated connection out of a `deadpool-redis`
//! pool and holds it until the transaction ends, so one attempt's `WATCH`
//! can never be observed by another attempt's `EXEC`. The connection goes
//! back to the pool once `EXEC` or `UNWATCH` has cleared the watch. A
//! transaction dropped while its watch is still live (an error path) detaches
//! the connection from the pool instead, and closing it clears the watch
//! server-side.

use std::fmt;

use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use tracing::debug;

use crate::core::traits::{AccountStore, OptimisticTransaction, WatchSet, WriteSet};
use crate::types::ChargeError;

/// Parse a stored balance
///
/// # Errors
///
/// Returns `ChargeError::CorruptBalance` unless `raw` is a non-negative integer.
pub fn parse_balance(key: &str, raw: &str) -> Result<u64, ChargeError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ChargeError::corrupt_balance(key, raw))
}

/// Pooled Redis account store
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Build a store for `url` with at most `pool_size` connections
    ///
    /// Connections are opened lazily on first use.
    ///
    /// # Errors
    ///
    /// Returns `ChargeError::Connection` if the URL or pool configuration is invalid.
    pub fn connect(url: &str, pool_size: usize) -> Result<Self, ChargeError> {
        let mut config = Config::from_url(url);
        config.pool = Some(PoolConfig::new(pool_size));
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ChargeError::connection(format!("Failed to create redis pool: {}", e)))?;

        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<Connection, ChargeError> {
        Ok(self.pool.get().await?)
    }
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("status", &self.pool.status())
            .finish()
    }
}

async fn read_balance(conn: &mut Connection, key: &str) -> Result<Option<u64>, ChargeError> {
    let raw: Option<String> = conn.get(key).await?;
    raw.map(|value| parse_balance(key, &value)).transpose()
}

#[async_trait]
impl AccountStore for RedisStore {
    type Transaction = RedisTransaction;

    async fn get(&self, key: &str) -> Result<Option<u64>, ChargeError> {
        let mut conn = self.connection().await?;
        read_balance(&mut conn, key).await
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), ChargeError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn begin(&self, watched: WatchSet) -> Result<RedisTransaction, ChargeError> {
        let conn = self.connection().await?;

        // Constructed before WATCH is sent so a failed WATCH is cleaned up on drop
        let mut tx = RedisTransaction {
            conn: Some(conn),
            watching: !watched.is_empty(),
            watched,
        };
        if !tx.watching {
            return Ok(tx);
        }

        let mut cmd = redis::cmd("WATCH");
        for key in tx.watched.keys() {
            cmd.arg(key);
        }
        let _: () = cmd.query_async(tx.session()?).await?;

        Ok(tx)
    }
}

/// Optimistic transaction holding its own pooled Redis connection
pub struct RedisTransaction {
    /// Always `Some` until drop
    conn: Option<Connection>,
    watched: WatchSet,
    /// Whether the server may still hold watch state for this connection
    watching: bool,
}

impl RedisTransaction {
    fn session(&mut self) -> Result<&mut Connection, ChargeError> {
        self.conn
            .as_mut()
            .ok_or_else(|| ChargeError::connection("transaction session already closed"))
    }
}

impl fmt::Debug for RedisTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTransaction")
            .field("watched", &self.watched)
            .field("watching", &self.watching)
            .finish()
    }
}

#[async_trait]
impl OptimisticTransaction for RedisTransaction {
    async fn get(&mut self, key: &str) -> Result<Option<u64>, ChargeError> {
        read_balance(self.session()?, key).await
    }

    async fn commit(mut self, writes: WriteSet) -> Result<(), ChargeError> {
        debug!(keys = %self.watched.describe(), writes = writes.len(), "Committing");

        let reply: Option<()> = if writes.is_empty() {
            // An empty pipeline is never sent, so MULTI/EXEC must be explicit
            let session = self.session()?;
            let _: () = redis::cmd("MULTI").query_async(&mut *session).await?;
            redis::cmd("EXEC").query_async(session).await?
        } else {
            let mut pipe = redis::pipe();
            pipe.atomic();
            for (key, value) in writes.iter() {
                pipe.set(key, value).ignore();
            }
            pipe.query_async(self.session()?).await?
        };
        // EXEC clears the watch whether or not it applied the writes
        self.watching = false;

        match reply {
            Some(()) => Ok(()),
            None => {
                debug!(keys = %self.watched.describe(), "EXEC aborted by watched key change");
                Err(ChargeError::conflict(self.watched.describe()))
            }
        }
    }

    async fn release(mut self) -> Result<(), ChargeError> {
        let _: () = redis::cmd("UNWATCH").query_async(self.session()?).await?;
        self.watching = false;
        Ok(())
    }
}

impl Drop for RedisTransaction {
    fn drop(&mut self) {
        if !self.watching {
            return;
        }
        if let Some(conn) = self.conn.take() {
            debug!(keys = %self.watched.describe(), "Discarding connection with live watch");
            drop(Connection::take(conn));
        }
    }
}
