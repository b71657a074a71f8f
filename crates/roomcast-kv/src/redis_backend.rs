//! Redis-backed [`KvBackend`].
//!
//! The listing walks the keyspace in `SCAN`/`MGET` batches, and the
//! conditional commit runs as a server-side Lua script — Redis
//! executes scripts atomically, which gives the "no writer touched
//! this key since the snapshot" guard that `WATCH`/`MULTI` provides
//! for dedicated connections. (A multiplexed connection interleaves
//! commands from many tasks, so `WATCH` state cannot live on it.)

use std::sync::Arc;
use std::time::Duration;

use redis::aio::MultiplexedConnection;

use crate::{KvBackend, KvError};

/// How long a single backend operation may take before it is reported
/// as unavailable instead of blocking a room's serialized path.
const OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Keys fetched per `SCAN` batch.
const SCAN_COUNT: usize = 100;

/// Commits ARGV[3] iff the key's current value still matches the
/// snapshot (ARGV[1] = "1" when the snapshot saw a value, ARGV[2] =
/// that value). Returns 1 on commit, 0 on conflict.
const CAS_SCRIPT: &str = r#"
local cur = redis.call('GET', KEYS[1])
if ARGV[1] == '1' then
    if cur == ARGV[2] then
        redis.call('SET', KEYS[1], ARGV[3])
        return 1
    end
    return 0
end
if cur == false then
    redis.call('SET', KEYS[1], ARGV[3])
    return 1
end
return 0
"#;

/// A [`KvBackend`] speaking to a Redis server.
#[derive(Clone)]
pub struct RedisBackend {
    conn: MultiplexedConnection,
    cas: Arc<redis::Script>,
}

impl RedisBackend {
    /// Connects to the Redis server at `url` (e.g. `redis://host:6379`).
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = redis::Client::open(url)
            .map_err(|e| KvError::NotConfigured(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| KvError::Unavailable(e.to_string()))?;
        tracing::debug!(url, "connected to Redis backend");
        Ok(Self {
            conn,
            cas: Arc::new(redis::Script::new(CAS_SCRIPT)),
        })
    }

    /// Connects using the `REDIS_URL` environment variable.
    ///
    /// # Errors
    /// Returns [`KvError::NotConfigured`] if the variable is not set —
    /// a fatal configuration error, not a retryable one.
    pub async fn from_env() -> Result<Self, KvError> {
        let url = std::env::var("REDIS_URL").map_err(|_| {
            KvError::NotConfigured("REDIS_URL is not set".into())
        })?;
        Self::connect(&url).await
    }
}

/// Runs a backend call with [`OP_TIMEOUT`]; elapsed timeouts and Redis
/// errors both surface as [`KvError::Unavailable`].
async fn with_timeout<T>(
    fut: impl Future<Output = redis::RedisResult<T>>,
) -> Result<T, KvError> {
    match tokio::time::timeout(OP_TIMEOUT, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(KvError::Unavailable(e.to_string())),
        Err(_) => Err(KvError::Unavailable("operation timed out".into())),
    }
}

impl KvBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.conn.clone();
        let key = key.to_string();
        with_timeout(async move {
            let raw: Option<String> =
                redis::cmd("GET").arg(&key).query_async(&mut conn).await?;
            Ok(raw)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let key = key.to_string();
        let value = value.to_string();
        with_timeout(async move {
            let () = redis::cmd("SET")
                .arg(&key)
                .arg(&value)
                .query_async(&mut conn)
                .await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let key = key.to_string();
        with_timeout(async move {
            let () = redis::cmd("DEL").arg(&key).query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn scan_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, KvError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        with_timeout(async move {
            let mut entries = Vec::new();
            let mut cursor: u64 = 0;
            loop {
                let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_COUNT)
                    .query_async(&mut conn)
                    .await?;
                cursor = next;

                if !keys.is_empty() {
                    let values: Vec<Option<String>> = redis::cmd("MGET")
                        .arg(&keys)
                        .query_async(&mut conn)
                        .await?;
                    for (key, value) in keys.into_iter().zip(values) {
                        // A key deleted between SCAN and MGET comes back
                        // nil; the scan is a best-effort snapshot.
                        if let Some(value) = value {
                            entries.push((key, value));
                        }
                    }
                }

                if cursor == 0 {
                    return Ok(entries);
                }
            }
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        next: &str,
    ) -> Result<bool, KvError> {
        let mut conn = self.conn.clone();
        let cas = Arc::clone(&self.cas);
        let key = key.to_string();
        let has_expected = if expected.is_some() { "1" } else { "0" };
        let expected = expected.unwrap_or("").to_string();
        let next = next.to_string();
        with_timeout(async move {
            let committed: i64 = cas
                .key(&key)
                .arg(has_expected)
                .arg(&expected)
                .arg(&next)
                .invoke_async(&mut conn)
                .await?;
            Ok(committed == 1)
        })
        .await
    }
}
