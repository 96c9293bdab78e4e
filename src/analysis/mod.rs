//! Rule-based deck analysis and its persisted cache

mod cache;
mod engine;
mod suggestions;

pub use cache::{AnalysisCache, is_fresh};
pub use engine::{AnalysisEngine, calculate_metrics, overall_rating};
pub use suggestions::generate_suggestions;
