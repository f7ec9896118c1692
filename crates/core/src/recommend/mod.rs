pub mod engine;
pub mod select;

pub use engine::RecommendationEngine;
pub use select::{group_by_ticker, rank, MINIMUM_ACCEPTED_SCORE};
