pub mod config;
pub mod errors;
pub mod telemetry;
pub mod types;

pub use config::{RankingConfig, RedisConfig, ServiceConfig};
pub use errors::{Result, ServiceError};
pub use telemetry::{init_metrics, init_tracing, record_counter, record_timing, shutdown};
pub use types::{now_millis, truncate_score, HealthStatus, ScoreEntry};
