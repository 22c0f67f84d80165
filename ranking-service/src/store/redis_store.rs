use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use shared::config::RedisConfig;
use shared::errors::{Result, ServiceError};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

use super::{RankingStore, StoreConnection};

#[derive(Clone)]
pub struct RedisRankingStore {
    client: Client,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl RedisRankingStore {
    /// Validates the DSN; no connection is opened until [`RankingStore::connect`].
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(|e: RedisError| {
            error!("Invalid REDIS_DSN {}: {}", config.redacted_url(), e);
            ServiceError::Config(format!("Invalid REDIS_DSN: {}", e))
        })?;

        Ok(Self {
            client,
            connect_timeout: config.connect_timeout,
            query_timeout: config.query_timeout,
        })
    }

    pub async fn ping(&self) -> Result<()> {
        let conn = self.open().await?;
        let mut redis = conn.redis.clone();

        with_timeout(self.query_timeout, "PING", async move {
            redis::cmd("PING").query_async::<String>(&mut redis).await
        })
        .await?;

        Ok(())
    }

    async fn open(&self) -> Result<RedisConnection> {
        let redis = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            error!(
                timeout_ms = self.connect_timeout.as_millis() as u64,
                "Timed out connecting to Redis"
            );
            ServiceError::StoreUnavailable("timed out connecting to Redis".to_string())
        })?
        .map_err(|e: RedisError| {
            error!("Error connecting to Redis: {}", e);
            ServiceError::StoreUnavailable(e.to_string())
        })?;

        debug!("Opened Redis connection");

        Ok(RedisConnection {
            redis,
            query_timeout: self.query_timeout,
        })
    }
}

#[async_trait]
impl RankingStore for RedisRankingStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>> {
        Ok(Box::new(self.open().await?))
    }
}

/// One request's connection. Dropping it closes the socket.
pub struct RedisConnection {
    redis: MultiplexedConnection,
    query_timeout: Duration,
}

#[async_trait]
impl StoreConnection for RedisConnection {
    async fn top_by_score(&self, key: &str, count: usize) -> Result<Vec<(String, f64)>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut redis = self.redis.clone();
        let end = isize::try_from(count - 1).unwrap_or(isize::MAX);

        let entries: Vec<(String, f64)> = with_timeout(self.query_timeout, "ZREVRANGE", async move {
            redis.zrevrange_withscores(key, 0, end).await
        })
        .await?;

        debug!(key, count = entries.len(), "Fetched ranked range");
        Ok(entries)
    }

    async fn hash_fields(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut redis = self.redis.clone();

        with_timeout(self.query_timeout, "HGETALL", async move {
            redis.hgetall(key).await
        })
        .await
    }
}

async fn with_timeout<T, F>(limit: Duration, command: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, RedisError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(command, "Redis command failed: {}", e);
            Err(ServiceError::StoreUnavailable(e.to_string()))
        }
        Err(_) => {
            error!(
                command,
                timeout_ms = limit.as_millis() as u64,
                "Redis command timed out"
            );
            Err(ServiceError::StoreUnavailable(format!("{} timed out", command)))
        }
    }
}
