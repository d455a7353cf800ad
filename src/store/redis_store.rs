//! Redis Store Module
//!
//! [`KvStore`] over a single multiplexed Redis connection shared by every
//! request.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError, RedisResult};
use tracing::{info, warn};

use super::{KeyTtl, KvStore, StoreError};

/// Pause before the first retry; later retries wait proportionally longer.
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Whether a command may be replayed after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Replaying has the same effect as running once
    Safe,
    /// A replay could apply the command twice
    Never,
}

// == Redis Store ==
/// Networked store client.
///
/// The multiplexed connection is cheap to clone and pipelines concurrent
/// commands over one socket.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    max_retries: u32,
}

impl RedisStore {
    // == Connect ==
    /// Opens the connection used for the lifetime of the process.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (`redis://` or `rediss://`)
    /// * `max_retries` - Extra attempts allowed for idempotent commands
    pub async fn connect(url: &str, max_retries: u32) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| StoreError::new("OPEN", "-", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::new("CONNECT", "-", e))?;

        info!("Redis connection ready");

        Ok(Self { conn, max_retries })
    }

    /// Runs one command against the shared connection under the retry
    /// policy for `replay`.
    async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        key: &str,
        replay: Replay,
        command: F,
    ) -> Result<T, StoreError>
    where
        F: Fn(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let retries = replay.retries(self.max_retries);
        retry(operation, key, retries, || command(self.conn.clone())).await
    }
}

impl Replay {
    /// Extra attempts allowed under a budget of `max_retries`.
    fn retries(self, max_retries: u32) -> u32 {
        match self {
            Replay::Safe => max_retries,
            Replay::Never => 0,
        }
    }
}

/// Runs `command`, repeating it up to `retries` more times on transient
/// faults with linearly growing pauses.
async fn retry<T, F, Fut>(
    operation: &'static str,
    key: &str,
    retries: u32,
    mut command: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RedisResult<T>>,
{
    let mut attempt = 0;
    loop {
        match command().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries && is_transient(&err) => {
                attempt += 1;
                warn!(
                    operation,
                    key,
                    attempt,
                    error = %err,
                    "Transient store error, retrying"
                );
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            Err(err) => return Err(StoreError::new(operation, key, err)),
        }
    }
}

/// Faults worth another attempt: the command may never have reached the server.
fn is_transient(err: &RedisError) -> bool {
    err.is_io_error() || err.is_timeout() || err.is_connection_dropped() || err.is_connection_refusal()
}

#[async_trait]
impl KvStore for RedisStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.run("INCR", key, Replay::Never, |mut conn| {
            let key = key.to_owned();
            async move {
                let count: i64 = conn.incr(&key, 1).await?;
                Ok::<_, RedisError>(count)
            }
        })
        .await
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, StoreError> {
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        self.run("EXPIRE", key, Replay::Safe, |mut conn| {
            let key = key.to_owned();
            async move {
                let applied: bool = conn.expire(&key, seconds).await?;
                Ok::<_, RedisError>(applied)
            }
        })
        .await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        self.run("TTL", key, Replay::Safe, |mut conn| {
            let key = key.to_owned();
            async move {
                let reply: i64 = conn.ttl(&key).await?;
                Ok::<_, RedisError>(KeyTtl::from_reply(reply))
            }
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.run("GET", key, Replay::Safe, |mut conn| {
            let key = key.to_owned();
            async move {
                let value: Option<String> = conn.get(&key).await?;
                Ok::<_, RedisError>(value)
            }
        })
        .await
    }

    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<(), StoreError> {
        self.run("SETEX", key, Replay::Safe, |mut conn| {
            let key = key.to_owned();
            let value = value.to_owned();
            async move {
                let _: () = conn.set_ex(&key, value, seconds).await?;
                Ok::<_, RedisError>(())
            }
        })
        .await
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        self.run("DEL", key, Replay::Safe, |mut conn| {
            let key = key.to_owned();
            async move {
                let removed: i64 = conn.del(&key).await?;
                Ok::<_, RedisError>(removed > 0)
            }
        })
        .await
    }
}
