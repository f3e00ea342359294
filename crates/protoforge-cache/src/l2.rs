//! Optional networked KV tier, backed by redis. Gated behind the
//! `redis-backend` feature so the crate compiles without a redis client for
//! tests and deployments that only want L1.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use protoforge_types::{CacheKey, CompilationResult};

use crate::error::{CacheError, Result};

pub struct L2Cache {
    conn: ConnectionManager,
    key_prefix: String,
    ttl: Duration,
}

impl L2Cache {
    pub async fn connect(addr: &str, password: Option<&str>, db: i64, key_prefix: impl Into<String>, ttl: Duration) -> Result<Self> {
        let mut url = format!("redis://{addr}/{db}");
        if let Some(password) = password {
            url = format!("redis://:{password}@{addr}/{db}");
        }
        let client = redis::Client::open(url).map_err(|err| CacheError::L2ConnectionFailed(err.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|err| CacheError::L2ConnectionFailed(err.to_string()))?;
        Ok(Self {
            conn,
            key_prefix: key_prefix.into(),
            ttl,
        })
    }

    fn namespaced(&self, key: &CacheKey) -> String {
        format!("{}{key}", self.key_prefix)
    }

    pub async fn get(&self, key: &CacheKey) -> Result<Option<CompilationResult>> {
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn
            .get(self.namespaced(key))
            .await
            .map_err(|err| CacheError::CacheUnavailable(err.to_string()))?;

        match raw {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|err| CacheError::CacheUnavailable(err.to_string())),
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &CacheKey, result: &CompilationResult) -> Result<()> {
        let bytes = serde_json::to_vec(result).map_err(|err| CacheError::CacheUnavailable(err.to_string()))?;
        let mut conn = self.conn.clone();
        let ttl_secs = self.ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(self.namespaced(key), bytes, ttl_secs)
            .await
            .map_err(|err| CacheError::CacheUnavailable(err.to_string()))
    }

    pub async fn delete(&self, key: &CacheKey) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.namespaced(key))
            .await
            .map_err(|err| CacheError::CacheUnavailable(err.to_string()))
    }

    /// Deletes every key under `{prefix}{module}:{version}:*` via `SCAN`,
    /// since `KEYS` blocks the server on large keyspaces.
    pub async fn invalidate_prefix(&self, module: &str, version: &str) -> Result<()> {
        let pattern = format!("{}{module}:{version}:*", self.key_prefix);
        let mut conn = self.conn.clone();
        let mut iter: redis::AsyncIter<String> = conn
            .scan_match(&pattern)
            .await
            .map_err(|err| CacheError::CacheUnavailable(err.to_string()))?;

        let mut matched = Vec::new();
        while let Some(key) = iter.next_item().await {
            matched.push(key);
        }
        drop(iter);

        if !matched.is_empty() {
            let mut conn = self.conn.clone();
            conn.del::<_, ()>(matched)
                .await
                .map_err(|err| CacheError::CacheUnavailable(err.to_string()))?;
        }
        Ok(())
    }
}
