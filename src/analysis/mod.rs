//! Type analysis
//!
//! - [`category`] - the closed set of category tags
//! - [`adjacency`] - the static weakness/resistance table
//! - [`effectiveness`] - combined profile of a tag set
//! - [`aggregation`] - category sampling and weakness frequencies
//! - [`export`] - CSV export of sampled records

pub mod adjacency;
pub mod aggregation;
pub mod category;
pub mod effectiveness;
pub mod export;

pub use adjacency::{CategoryAdjacency, Relations};
pub use aggregation::{AggregationEngine, AggregationResult, CategoryAnalysis, StatAverages, WeaknessShare};
pub use category::Category;
pub use effectiveness::{Effectiveness, EffectivenessEngine};
