//! Category adjacency table
//!
//! Static mapping from a category to the categories it is weak to and the
//! categories it resists. Built once at startup, read-only afterwards.
//!
//! The built-in table is the reference chart. An override can be supplied as a
//! TOML file of the form:
//!
//! ```toml
//! [fire]
//! weaknesses = ["water", "ground", "rock"]
//! resistances = ["fire", "grass", "ice", "bug", "steel", "fairy"]
//! ```
//!
//! A malformed override is a startup error; the process should not run on a
//! table it cannot trust.

use crate::analysis::category::Category;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Weakness/resistance sets for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relations {
    #[serde(default)]
    pub weaknesses: BTreeSet<Category>,
    #[serde(default)]
    pub resistances: BTreeSet<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAdjacency {
    table: HashMap<Category, Relations>,
}

/// Raw override entry; kept as strings so unknown names can be reported by name.
#[derive(Debug, Deserialize)]
struct RawRelations {
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    resistances: Vec<String>,
}

const BUILTIN: &[(Category, &[Category], &[Category])] = {
    use Category::*;
    &[
        (Normal, &[Fighting], &[]),
        (Fire, &[Water, Ground, Rock], &[Fire, Grass, Ice, Bug, Steel, Fairy]),
        (Water, &[Electric, Grass], &[Fire, Water, Ice, Steel]),
        (Electric, &[Ground], &[Electric, Flying, Steel]),
        (Grass, &[Fire, Ice, Poison, Flying, Bug], &[Water, Electric, Grass, Ground]),
        (Ice, &[Fire, Fighting, Rock, Steel], &[Ice]),
        (Fighting, &[Flying, Psychic, Fairy], &[Rock, Bug, Dark]),
        (Poison, &[Ground, Psychic], &[Grass, Fighting, Poison, Bug, Fairy]),
        (Ground, &[Water, Grass, Ice], &[Poison, Rock]),
        (Flying, &[Electric, Ice, Rock], &[Grass, Fighting, Bug]),
        (Psychic, &[Bug, Ghost, Dark], &[Fighting, Psychic]),
        (Bug, &[Fire, Flying, Rock], &[Grass, Fighting, Ground]),
        (Rock, &[Water, Grass, Fighting, Ground, Steel], &[Normal, Fire, Poison, Flying]),
        (Ghost, &[Ghost, Dark], &[Poison, Bug]),
        (Dragon, &[Ice, Dragon, Fairy], &[Fire, Water, Electric, Grass]),
        (Dark, &[Fighting, Bug, Fairy], &[Ghost, Dark]),
        (
            Steel,
            &[Fire, Fighting, Ground],
            &[Normal, Grass, Ice, Flying, Psychic, Bug, Rock, Dragon, Steel, Fairy],
        ),
        (Fairy, &[Poison, Steel], &[Fighting, Bug, Dark]),
    ]
};

impl CategoryAdjacency {
    /// The reference table covering all eighteen categories.
    pub fn builtin() -> Self {
        let table = BUILTIN
            .iter()
            .map(|(category, weak, resist)| {
                (
                    *category,
                    Relations {
                        weaknesses: weak.iter().copied().collect(),
                        resistances: resist.iter().copied().collect(),
                    },
                )
            })
            .collect();
        Self { table }
    }

    /// An empty table; every lookup degrades to empty sets.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Build from explicit entries (tests, embedding).
    pub fn from_entries(entries: impl IntoIterator<Item = (Category, Relations)>) -> Self {
        Self {
            table: entries.into_iter().collect(),
        }
    }

    /// Parse an override table. Unknown category names anywhere in the file,
    /// or a tag listed as both weakness and resistance of the same category,
    /// make the table malformed.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: HashMap<String, RawRelations> = toml::from_str(content)
            .map_err(|e| AppError::Configuration(format!("Invalid adjacency table: {}", e)))?;

        let mut table = HashMap::with_capacity(raw.len());
        for (name, relations) in raw {
            let category = parse_entry(&name, &name)?;
            let weaknesses = relations
                .weaknesses
                .iter()
                .map(|tag| parse_entry(tag, &name))
                .collect::<Result<BTreeSet<_>>>()?;
            let resistances = relations
                .resistances
                .iter()
                .map(|tag| parse_entry(tag, &name))
                .collect::<Result<BTreeSet<_>>>()?;

            if let Some(both) = weaknesses.intersection(&resistances).next() {
                return Err(AppError::Configuration(format!(
                    "Adjacency entry '{}' lists '{}' as both weakness and resistance",
                    name, both
                )));
            }

            table.insert(
                category,
                Relations {
                    weaknesses,
                    resistances,
                },
            );
        }

        Ok(Self { table })
    }

    /// Load an override table from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let table = Self::from_toml_str(&content)?;
        let missing = table.missing_categories();
        if !missing.is_empty() {
            tracing::warn!(
                path = %path.display(),
                missing = ?missing,
                "Adjacency table does not cover every category; missing entries resolve to empty sets"
            );
        }
        Ok(table)
    }

    /// Relations for a category, if the table has an entry.
    pub fn get(&self, category: Category) -> Option<&Relations> {
        self.table.get(&category)
    }

    /// Categories with no entry, in enumeration order.
    pub fn missing_categories(&self) -> Vec<Category> {
        Category::ALL
            .iter()
            .copied()
            .filter(|c| !self.table.contains_key(c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for CategoryAdjacency {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse_entry(tag: &str, entry: &str) -> Result<Category> {
    tag.parse::<Category>().map_err(|_| {
        AppError::Configuration(format!(
            "Adjacency entry '{}' references unknown category '{}'",
            entry, tag
        ))
    })
}
