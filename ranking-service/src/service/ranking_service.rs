use futures::{stream, StreamExt, TryStreamExt};
use shared::config::RankingConfig;
use shared::errors::{Result, ServiceError};
use shared::types::{truncate_score, ScoreEntry};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::store::{best_score_key, RankingStore, LEADERBOARD_KEY};

const TS_FIELD: &str = "ts";

#[derive(Clone)]
pub struct RankingService {
    store: Arc<dyn RankingStore>,
    config: RankingConfig,
}

impl RankingService {
    pub fn new(store: Arc<dyn RankingStore>, mut config: RankingConfig) -> Self {
        if config.metadata_concurrency == 0 {
            warn!("Metadata concurrency of 0 would never make progress, using 1");
            config.metadata_concurrency = 1;
        }
        Self { store, config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Applies the default when no limit was given and clamps to the configured cap.
    pub fn resolve_limit(&self, requested: Option<usize>) -> usize {
        let limit = requested.unwrap_or(self.config.default_limit);

        if limit > self.config.max_limit {
            warn!(
                requested = limit,
                max = self.config.max_limit,
                "Requested limit exceeds cap, clamping"
            );
            return self.config.max_limit;
        }

        limit
    }

    /// Top entries by descending score, each enriched with the user's best-score timestamp.
    ///
    /// The whole request fails with [`ServiceError::StoreUnavailable`] if any store
    /// call fails or the round outlives `request_timeout`; partial results are
    /// never returned.
    #[tracing::instrument(skip(self))]
    pub async fn get_top_rankings(&self, requested: Option<usize>) -> Result<Vec<ScoreEntry>> {
        let limit = self.resolve_limit(requested);
        let start = Instant::now();

        info!("Fetching top rankings with limit: {}", limit);
        shared::record_counter("rankings.top.requests", 1);

        let deadline = self.config.request_timeout;
        let result = tokio::time::timeout(deadline, self.fetch_top(limit))
            .await
            .unwrap_or_else(|_| {
                Err(ServiceError::StoreUnavailable(format!(
                    "rankings query exceeded {}ms",
                    deadline.as_millis()
                )))
            });
        shared::record_timing("rankings.top.duration_seconds", start.elapsed().as_secs_f64());

        match &result {
            Ok(entries) => {
                info!("Successfully fetched {} rankings from store", entries.len());
            }
            Err(e) => {
                error!(limit, "Error fetching top rankings: {}", e);
                shared::record_counter("rankings.top.failures", 1);
            }
        }

        result
    }

    async fn fetch_top(&self, limit: usize) -> Result<Vec<ScoreEntry>> {
        if limit == 0 {
            debug!("Limit is zero, skipping store round");
            return Ok(Vec::new());
        }

        let conn = self.store.connect().await?;
        let conn = conn.as_ref();

        let ranked = conn.top_by_score(LEADERBOARD_KEY, limit).await?;
        if ranked.len() > limit {
            return Err(ServiceError::Internal(format!(
                "store returned {} entries for limit {}",
                ranked.len(),
                limit
            )));
        }

        let entries: Vec<ScoreEntry> = stream::iter(ranked)
            .map(|(user_id, score)| async move {
                let meta = conn.hash_fields(&best_score_key(&user_id)).await?;
                Ok::<_, ServiceError>(build_entry(user_id, score, &meta))
            })
            .buffered(self.config.metadata_concurrency)
            .try_collect()
            .await?;

        let synthetic = entries.iter().filter(|e| e.synthetic_ts).count();
        if synthetic > 0 {
            debug!(synthetic, "Substituted current time for missing timestamps");
        }

        Ok(entries)
    }
}

fn build_entry(user_id: String, score: f64, meta: &HashMap<String, String>) -> ScoreEntry {
    let score = truncate_score(score);

    match meta.get(TS_FIELD).and_then(|raw| parse_ts(raw)) {
        Some(ts) => ScoreEntry::new(user_id, score, ts),
        None => ScoreEntry::with_synthetic_ts(user_id, score),
    }
}

/// Accepts integer strings and numeric encodings such as "1.7e12".
fn parse_ts(raw: &str) -> Option<i64> {
    let raw = raw.trim();

    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v as i64)
    })
}
