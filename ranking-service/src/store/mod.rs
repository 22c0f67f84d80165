pub mod redis_store;

use std::collections::HashMap;

use async_trait::async_trait;
use shared::errors::Result;

pub use redis_store::RedisRankingStore;

/// Sorted collection holding every user's best score.
pub const LEADERBOARD_KEY: &str = "game:scores";

/// Prefix of the per-user metadata hash, followed by the user id.
pub const BEST_SCORE_PREFIX: &str = "game:scores:best:";

pub fn best_score_key(user_id: &str) -> String {
    format!("{}{}", BEST_SCORE_PREFIX, user_id)
}

/// A source of scoped store connections.
///
/// Every call to [`RankingStore::connect`] hands out a connection owned by the
/// caller; it is released when dropped, on success and error paths alike.
#[async_trait]
pub trait RankingStore: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>>;
}

#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// Members of the sorted set at `key` with the `count` highest scores,
    /// highest first. Ties come back in the store's native order.
    async fn top_by_score(&self, key: &str, count: usize) -> Result<Vec<(String, f64)>>;

    /// All field/value pairs of the hash at `key`; empty when the key is missing.
    async fn hash_fields(&self, key: &str) -> Result<HashMap<String, String>>;
}
