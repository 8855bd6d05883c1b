//! Combined weakness/resistance derivation for multi-tag entities.

use crate::analysis::adjacency::CategoryAdjacency;
use crate::analysis::category::Category;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Derived defensive profile of a tag combination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effectiveness {
    pub weaknesses: BTreeSet<Category>,
    pub resistances: BTreeSet<Category>,
}

/// Pure engine over a shared adjacency table.
#[derive(Debug, Clone)]
pub struct EffectivenessEngine {
    adjacency: Arc<CategoryAdjacency>,
}

impl EffectivenessEngine {
    pub fn new(adjacency: Arc<CategoryAdjacency>) -> Self {
        Self { adjacency }
    }

    pub fn builtin() -> Self {
        Self::new(Arc::new(CategoryAdjacency::builtin()))
    }

    pub fn adjacency(&self) -> &CategoryAdjacency {
        &self.adjacency
    }

    /// Union the relations of every tag, then drop any weakness that some tag
    /// resists. Resistances are returned as the full union.
    ///
    /// Tags without a table entry contribute nothing. Output does not depend on
    /// tag order.
    pub fn compute(&self, tags: &[Category]) -> Effectiveness {
        let mut weaknesses = BTreeSet::new();
        let mut resistances = BTreeSet::new();

        for tag in tags {
            if let Some(relations) = self.adjacency.get(*tag) {
                weaknesses.extend(relations.weaknesses.iter().copied());
                resistances.extend(relations.resistances.iter().copied());
            }
        }

        weaknesses.retain(|c| !resistances.contains(c));

        Effectiveness {
            weaknesses,
            resistances,
        }
    }

    /// Same as [`compute`](Self::compute) for raw tag strings; unparseable tags are ignored.
    pub fn compute_raw<S: AsRef<str>>(&self, tags: &[S]) -> Effectiveness {
        let parsed: Vec<Category> = tags
            .iter()
            .filter_map(|t| t.as_ref().parse::<Category>().ok())
            .collect();
        self.compute(&parsed)
    }
}

impl Default for EffectivenessEngine {
    fn default() -> Self {
        Self::builtin()
    }
}
