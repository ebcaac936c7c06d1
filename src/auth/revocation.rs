//! Token revocation (logout blacklist).
//!
//! A revoked token's raw string is stored as a key with a TTL. The authentication
//! gate treats any error from the store as "unavailable" and rejects the request,
//! never as "not revoked".

use async_trait::async_trait;
use log::info;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{timeout, Instant};

use crate::store::{StoreError, StoreResult};

const BLACKLIST_VALUE: &str = "blacklisted";

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Marks `token` as revoked for `ttl`.
    async fn blacklist(&self, token: &str, ttl: Duration) -> StoreResult<()>;

    async fn is_blacklisted(&self, token: &str) -> StoreResult<bool>;
}

/// How long a blacklist entry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationPolicy {
    pub ttl: Duration,
    /// When set, the entry lives at least as long as the token would.
    pub cover_token_lifetime: bool,
}

impl RevocationPolicy {
    pub fn ttl_for(&self, remaining_token_lifetime: Duration) -> Duration {
        if self.cover_token_lifetime {
            self.ttl.max(remaining_token_lifetime)
        } else {
            self.ttl
        }
    }
}

impl Default for RevocationPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            cover_token_lifetime: false,
        }
    }
}

/// Redis-backed blacklist. A connection is opened for each operation and dropped
/// when it returns, whatever the outcome.
#[derive(Clone)]
pub struct RedisRevocationStore {
    client: redis::Client,
    op_timeout: Duration,
}

impl RedisRevocationStore {
    pub fn new(redis_url: &str, op_timeout: Duration) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {}", e)))?;
        Ok(Self { client, op_timeout })
    }

    async fn connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        timeout(self.op_timeout, self.client.get_multiplexed_async_connection())
            .await
            .map_err(|_| StoreError::Unavailable("timed out connecting to redis".into()))?
            .map_err(|e| StoreError::Unavailable(format!("redis connection failed: {}", e)))
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn blacklist(&self, token: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let seconds = ttl.as_secs().max(1);
        let write = async {
            let _: () = conn.set_ex(token, BLACKLIST_VALUE, seconds).await?;
            Ok::<(), redis::RedisError>(())
        };
        timeout(self.op_timeout, write)
            .await
            .map_err(|_| StoreError::Unavailable("timed out writing to redis".into()))?
            .map_err(|e| StoreError::Unavailable(format!("failed to blacklist token: {}", e)))?;
        info!("Token blacklisted for {}s", seconds);
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let read = async {
            let exists: bool = conn.exists(token).await?;
            Ok::<bool, redis::RedisError>(exists)
        };
        timeout(self.op_timeout, read)
            .await
            .map_err(|_| StoreError::Unavailable("timed out reading from redis".into()))?
            .map_err(|e| StoreError::Unavailable(format!("failed to check blacklist: {}", e)))
    }
}

/// In-process blacklist with lazy expiry.
#[derive(Clone, Default)]
pub struct MemoryRevocationStore {
    entries: Arc<RwLock<HashMap<String, Instant>>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|deadline| **deadline > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn blacklist(&self, token: &str, ttl: Duration) -> StoreResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, deadline| *deadline > now);
        entries.insert(token.to_string(), now + ttl);
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> StoreResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(token)
            .map_or(false, |deadline| *deadline > now))
    }
}
