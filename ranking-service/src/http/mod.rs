pub mod handlers;
pub mod router;

pub use handlers::RankingRow;
pub use router::{build_router, cors_layer, AppState};
