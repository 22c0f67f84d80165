#![allow(dead_code)]

use async_trait::async_trait;
use ranking_service::service::RankingService;
use ranking_service::store::{RankingStore, StoreConnection};
use shared::config::RankingConfig;
use shared::errors::{Result, ServiceError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct StoreCounters {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
    pub range_queries: AtomicUsize,
    pub hash_queries: AtomicUsize,
}

/// Sorted-set and hash store held in memory, ordered the way Redis orders
/// `ZREVRANGE`: score descending, then member descending.
#[derive(Default)]
pub struct InMemoryStore {
    sorted_sets: HashMap<String, Vec<(String, f64)>>,
    hashes: HashMap<String, HashMap<String, String>>,
    fail_hash_key: Option<String>,
    hash_delay: Option<Duration>,
    pub counters: Arc<StoreCounters>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(mut self, key: &str, member: &str, score: f64) -> Self {
        let set = self.sorted_sets.entry(key.to_string()).or_default();
        set.retain(|(m, _)| m != member);
        set.push((member.to_string(), score));
        self
    }

    pub fn with_hash_field(mut self, key: &str, field: &str, value: &str) -> Self {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        self
    }

    pub fn failing_hash(mut self, key: &str) -> Self {
        self.fail_hash_key = Some(key.to_string());
        self
    }

    /// Every hash read stalls for `delay` before answering.
    pub fn slow_hashes(mut self, delay: Duration) -> Self {
        self.hash_delay = Some(delay);
        self
    }

    fn snapshot(&self) -> InMemoryConnection {
        InMemoryConnection {
            sorted_sets: self.sorted_sets.clone(),
            hashes: self.hashes.clone(),
            fail_hash_key: self.fail_hash_key.clone(),
            hash_delay: self.hash_delay,
            counters: self.counters.clone(),
        }
    }
}

#[async_trait]
impl RankingStore for InMemoryStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.snapshot()))
    }
}

pub struct InMemoryConnection {
    sorted_sets: HashMap<String, Vec<(String, f64)>>,
    hashes: HashMap<String, HashMap<String, String>>,
    fail_hash_key: Option<String>,
    hash_delay: Option<Duration>,
    counters: Arc<StoreCounters>,
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreConnection for InMemoryConnection {
    async fn top_by_score(&self, key: &str, count: usize) -> Result<Vec<(String, f64)>> {
        self.counters.range_queries.fetch_add(1, Ordering::SeqCst);

        let mut members = self.sorted_sets.get(key).cloned().unwrap_or_default();
        members.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        members.truncate(count);
        Ok(members)
    }

    async fn hash_fields(&self, key: &str) -> Result<HashMap<String, String>> {
        self.counters.hash_queries.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.hash_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_hash_key.as_deref() == Some(key) {
            return Err(ServiceError::StoreUnavailable(format!(
                "connection reset while reading {}",
                key
            )));
        }

        Ok(self.hashes.get(key).cloned().unwrap_or_default())
    }
}

/// Store whose connections can never be acquired.
#[derive(Default)]
pub struct UnreachableStore {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl RankingStore for UnreachableStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ServiceError::StoreUnavailable("connection refused".to_string()))
    }
}

/// Leaderboard of `(user, score, ts)` rows with best-score metadata filled in.
pub fn seeded_store(rows: &[(&str, f64, Option<&str>)]) -> InMemoryStore {
    rows.iter().fold(InMemoryStore::new(), |store, (user, score, ts)| {
        let store = store.with_score("game:scores", user, *score);
        let key = format!("game:scores:best:{}", user);
        let store = store.with_hash_field(&key, "score", &score.to_string());
        match ts {
            Some(ts) => store.with_hash_field(&key, "ts", ts),
            None => store,
        }
    })
}

pub fn service_with(store: Arc<dyn RankingStore>) -> RankingService {
    RankingService::new(store, RankingConfig::default())
}

pub fn service_with_config(store: Arc<dyn RankingStore>, config: RankingConfig) -> RankingService {
    RankingService::new(store, config)
}
