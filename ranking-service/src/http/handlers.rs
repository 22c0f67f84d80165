use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use shared::errors::{Result, ServiceError};
use shared::types::{HealthStatus, ScoreEntry};

use super::router::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TopRankingsParams {
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRow {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub score: i64,
    pub ts: i64,
    #[serde(rename = "tsSynthetic", default, skip_serializing_if = "Option::is_none")]
    pub ts_synthetic: Option<bool>,
}

impl RankingRow {
    fn from_entry(entry: ScoreEntry, mark_synthetic: bool) -> Self {
        Self {
            ts_synthetic: (mark_synthetic && entry.synthetic_ts).then_some(true),
            user_id: entry.user_id,
            score: entry.score,
            ts: entry.ts,
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::healthy(state.service_name.as_ref()))
}

pub async fn top_rankings(
    State(state): State<AppState>,
    params: std::result::Result<Query<TopRankingsParams>, QueryRejection>,
) -> Result<Json<Vec<RankingRow>>> {
    let Query(params) =
        params.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
    let requested = parse_limit(params.limit.as_deref())?;
    let mark_synthetic = state.rankings.config().mark_synthetic_ts;

    let entries = state.rankings.get_top_rankings(requested).await?;

    Ok(Json(
        entries
            .into_iter()
            .map(|entry| RankingRow::from_entry(entry, mark_synthetic))
            .collect(),
    ))
}

/// An absent or blank `limit` means "use the default"; anything that is not a
/// non-negative integer is rejected.
pub fn parse_limit(raw: Option<&str>) -> Result<Option<usize>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    let value: i64 = raw.parse().map_err(|_| {
        ServiceError::BadRequest(format!("limit must be an integer, got '{}'", raw))
    })?;

    if value < 0 {
        return Err(ServiceError::BadRequest(format!(
            "limit must not be negative, got {}",
            value
        )));
    }

    usize::try_from(value)
        .map(Some)
        .map_err(|_| ServiceError::BadRequest(format!("limit {} is out of range", value)))
}
