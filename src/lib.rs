//! # Oak - Pokémon research orchestration
//!
//! Oak coordinates a small team of research roles over the PokéAPI: a planner
//! decomposes a goal, a collector samples a category and derives weakness
//! statistics, and a reporter renders the findings.
//!
//! ## Overview
//!
//! Oak can be used in two ways:
//!
//! 1. **As a CLI** - Run the `oak` binary (`oak research "Analyze Fire-type weaknesses"`)
//! 2. **As a library** - Wire the components into your own program
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use oak::{AppState, OakConfig};
//!
//! #[tokio::main]
//! async fn main() -> oak::Result<()> {
//!     let config = OakConfig::load(None)?;
//!     let state = AppState::build(config, false)?;
//!
//!     let outcome = state.orchestrator().run("Analyze Fire-type Pokémon weaknesses").await;
//!     println!("{}", outcome.final_report());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`analysis`] - Categories, effectiveness, and aggregation
//! - [`data`] - HTTP data client and entity caches
//! - [`research`] - Planner, orchestrator, report, and collaborators
//! - [`cli`] - Command line parsing and output
//! - [`types`] - Shared records and error handling
//! - [`utils`] - Configuration

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Type analysis and aggregate statistics.
pub mod analysis;
/// Command line interface.
pub mod cli;
/// Data source client and caches.
pub mod data;
/// Multi-role research coordination.
pub mod research;
/// Core types (records, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use analysis::{AggregationEngine, AggregationResult, Category, CategoryAdjacency, EffectivenessEngine};
pub use data::{DataClient, EntityCache, EntitySource};
pub use research::{Orchestrator, ResearchOutcome, TaskPlan, TaskPlanner};
pub use types::{AppError, EntityRecord, FetchOutcome, Result};
pub use utils::config::OakConfig;

use crate::data::{DiskEntityCache, MemoryEntityCache, NoOpCache};
use crate::research::narrator::{Narrator, OllamaNarrator};
use std::sync::Arc;

/// Wired components shared by every command
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<OakConfig>,
    /// Entity cache injected into the client
    pub cache: Arc<dyn EntityCache>,
    pub client: Arc<DataClient>,
    pub aggregation: Arc<AggregationEngine>,
    /// Present when `narrator.enabled` is set
    pub narrator: Option<Arc<dyn Narrator>>,
}

impl AppState {
    /// Build the component graph from configuration.
    ///
    /// Fails only on startup problems: a malformed adjacency override, an
    /// unusable cache directory, or an invalid credential.
    pub fn build(config: OakConfig, no_cache: bool) -> Result<Self> {
        let adjacency = match &config.analysis.adjacency_file {
            Some(path) => CategoryAdjacency::load(path)?,
            None => CategoryAdjacency::builtin(),
        };
        let engine = EffectivenessEngine::new(Arc::new(adjacency));

        let cache: Arc<dyn EntityCache> = if no_cache || !config.cache.enabled {
            Arc::new(NoOpCache::new())
        } else if config.cache.persist {
            Arc::new(DiskEntityCache::open(&config.cache.directory)?)
        } else {
            Arc::new(MemoryEntityCache::new())
        };

        let client = Arc::new(DataClient::new(&config.data, cache.clone(), engine)?);
        let aggregation = Arc::new(
            AggregationEngine::new(client.clone())
                .with_concurrency(config.analysis.fetch_concurrency),
        );

        let narrator: Option<Arc<dyn Narrator>> = if config.narrator.enabled {
            Some(Arc::new(OllamaNarrator::new(&config.narrator)?))
        } else {
            None
        };

        tracing::debug!(
            base_url = %client.base_url(),
            cache_enabled = cache.is_enabled(),
            narrator = narrator.is_some(),
            "Application state ready"
        );

        Ok(Self {
            config: Arc::new(config),
            cache,
            client,
            aggregation,
            narrator,
        })
    }

    /// Orchestrator with the standard roles and configured limits.
    pub fn orchestrator(&self) -> Orchestrator {
        let orchestrator = Orchestrator::standard(
            self.aggregation.clone(),
            self.config.analysis.sample_bound,
            &self.config.orchestrator,
        );
        match &self.narrator {
            Some(narrator) => orchestrator.with_narrator(narrator.clone()),
            None => orchestrator,
        }
    }
}
