pub mod http;
pub mod service;
pub mod store;

pub use http::{build_router, AppState, RankingRow};
pub use service::RankingService;
pub use store::{RankingStore, RedisRankingStore, StoreConnection};
