//! Category sampling and weakness frequency statistics.

use crate::analysis::category::Category;
use crate::data::client::EntitySource;
use crate::types::{BaseStats, EntityRecord, FetchOutcome};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of members fetched in detail
pub const DEFAULT_SAMPLE_BOUND: usize = 10;

/// Share of sampled entities carrying one weakness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaknessShare {
    pub category: Category,
    pub count: usize,
    /// `count / sampled * 100`
    pub percentage: f64,
}

/// Mean base stats over the sampled entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatAverages {
    pub hp: f64,
    pub attack: f64,
    pub defense: f64,
    pub special_attack: f64,
    pub special_defense: f64,
    pub speed: f64,
}

impl StatAverages {
    /// `None` for an empty slice.
    pub fn from_stats<'a>(stats: impl IntoIterator<Item = &'a BaseStats>) -> Option<Self> {
        let mut sums = [0u64; 6];
        let mut n = 0u64;
        for s in stats {
            for (sum, v) in sums.iter_mut().zip(s.values()) {
                *sum += u64::from(v);
            }
            n += 1;
        }
        if n == 0 {
            return None;
        }

        let mean = |i: usize| sums[i] as f64 / n as f64;
        Some(Self {
            hp: mean(0),
            attack: mean(1),
            defense: mean(2),
            special_attack: mean(3),
            special_defense: mean(4),
            speed: mean(5),
        })
    }

    /// Values in [`BaseStats::NAMES`] order.
    pub fn values(&self) -> [f64; 6] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.special_attack,
            self.special_defense,
            self.speed,
        ]
    }
}

/// Result of analyzing one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// `None` when no category could be determined
    pub category: Option<Category>,
    /// Entities successfully fetched
    pub count: usize,
    /// Identifiers attempted after truncation
    pub requested: usize,
    /// Category size reported by the source
    pub members_total: usize,
    /// Identifiers that did not resolve, in sample order
    pub skipped: Vec<String>,
    /// Weakness shares in first-seen order
    pub percentages: Vec<WeaknessShare>,
    pub highest: Option<WeaknessShare>,
    pub average_stats: Option<StatAverages>,
}

impl AggregationResult {
    pub fn empty(category: Option<Category>) -> Self {
        Self {
            category,
            count: 0,
            requested: 0,
            members_total: 0,
            skipped: Vec::new(),
            percentages: Vec::new(),
            highest: None,
            average_stats: None,
        }
    }

    /// Tally weaknesses over `records`.
    ///
    /// Records are visited in order and each record's weaknesses in category
    /// order; the tally keeps first-seen order and the highest entry is the
    /// first to reach the maximum.
    pub fn from_records(
        category: Option<Category>,
        members_total: usize,
        requested: usize,
        records: &[EntityRecord],
        skipped: Vec<String>,
    ) -> Self {
        let mut tally: Vec<(Category, usize)> = Vec::new();
        for record in records {
            for weakness in &record.weaknesses {
                match tally.iter_mut().find(|(c, _)| c == weakness) {
                    Some((_, n)) => *n += 1,
                    None => tally.push((*weakness, 1)),
                }
            }
        }

        let sampled = records.len();
        let percentages: Vec<WeaknessShare> = if sampled == 0 {
            Vec::new()
        } else {
            tally
                .into_iter()
                .map(|(category, count)| WeaknessShare {
                    category,
                    count,
                    percentage: count as f64 / sampled as f64 * 100.0,
                })
                .collect()
        };

        let mut highest: Option<WeaknessShare> = None;
        for share in &percentages {
            if highest.map_or(true, |h| share.percentage > h.percentage) {
                highest = Some(*share);
            }
        }

        Self {
            category,
            count: sampled,
            requested,
            members_total,
            skipped,
            percentages,
            highest,
            average_stats: StatAverages::from_stats(records.iter().map(|r| &r.stats)),
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }

    pub fn percentage_of(&self, category: Category) -> Option<f64> {
        self.percentages
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.percentage)
    }

    /// Shares by descending percentage; equal shares keep first-seen order.
    pub fn sorted_by_percentage(&self) -> Vec<WeaknessShare> {
        let mut sorted = self.percentages.clone();
        sorted.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        sorted
    }
}

/// Aggregation result plus the records it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub result: AggregationResult,
    pub records: Vec<EntityRecord>,
}

impl CategoryAnalysis {
    pub fn empty(category: Option<Category>) -> Self {
        Self {
            result: AggregationResult::empty(category),
            records: Vec::new(),
        }
    }
}

pub struct AggregationEngine {
    source: Arc<dyn EntitySource>,
    concurrency: usize,
}

impl AggregationEngine {
    pub fn new(source: Arc<dyn EntitySource>) -> Self {
        Self {
            source,
            concurrency: 1,
        }
    }

    /// Fetch up to `n` details at once. Output order is unaffected.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub async fn analyze_category(&self, category: Category, sample_bound: usize) -> AggregationResult {
        self.analyze_category_detailed(category, sample_bound)
            .await
            .result
    }

    /// Sample the first `sample_bound` members of `category` and tally them.
    pub async fn analyze_category_detailed(
        &self,
        category: Category,
        sample_bound: usize,
    ) -> CategoryAnalysis {
        let members = self.source.fetch_category_members(category.as_str()).await;
        let sample: Vec<String> = members.iter().take(sample_bound).cloned().collect();

        tracing::info!(
            category = %category,
            members = members.len(),
            sample = sample.len(),
            concurrency = self.concurrency,
            "Analyzing category"
        );

        let outcomes: Vec<FetchOutcome<EntityRecord>> = if self.concurrency <= 1 {
            let mut outcomes = Vec::with_capacity(sample.len());
            for name in &sample {
                outcomes.push(self.source.fetch_entity(name).await);
            }
            outcomes
        } else {
            // Owned names and a cloned source keep each future 'static.
            stream::iter(sample.clone())
                .map(|name| {
                    let source = self.source.clone();
                    async move { source.fetch_entity(&name).await }
                })
                .buffered(self.concurrency)
                .collect()
                .await
        };

        let mut records = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (name, outcome) in sample.iter().zip(outcomes) {
            match outcome {
                FetchOutcome::Found(record) => records.push(record),
                FetchOutcome::NotFound => {
                    tracing::warn!(name = %name, "Skipping entity: not found");
                    skipped.push(name.clone());
                }
                FetchOutcome::TransientFailure { attempts, .. } => {
                    tracing::warn!(name = %name, attempts, "Skipping entity: fetch failed");
                    skipped.push(name.clone());
                }
            }
        }

        let result = AggregationResult::from_records(
            Some(category),
            members.len(),
            sample.len(),
            &records,
            skipped,
        );

        tracing::info!(
            category = %category,
            analyzed = result.count,
            skipped = result.skipped.len(),
            "Category analysis complete"
        );

        CategoryAnalysis { result, records }
    }
}
