use crate::analysis::category::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============= Entity Types =============

/// The six base stats reported by the data source.
///
/// Any stat missing from a payload defaults to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub special_attack: u32,
    pub special_defense: u32,
    pub speed: u32,
}

impl BaseStats {
    /// Stat names in the order the data source lists them.
    pub const NAMES: [&'static str; 6] = [
        "hp",
        "attack",
        "defense",
        "special_attack",
        "special_defense",
        "speed",
    ];

    /// Stat values in [`BaseStats::NAMES`] order.
    pub fn values(&self) -> [u32; 6] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.special_attack,
            self.special_defense,
            self.speed,
        ]
    }

    /// Set a stat by its API name. Hyphenated names (`special-attack`) are accepted.
    /// Returns `false` for names outside the fixed six.
    pub fn set(&mut self, name: &str, value: u32) -> bool {
        match name.replace('-', "_").as_str() {
            "hp" => self.hp = value,
            "attack" => self.attack = value,
            "defense" => self.defense = value,
            "special_attack" => self.special_attack = value,
            "special_defense" => self.special_defense = value,
            "speed" => self.speed = value,
            _ => return false,
        }
        true
    }

    pub fn total(&self) -> u32 {
        self.values().iter().sum()
    }
}

/// A researched entity, built once from a raw payload and never mutated afterwards.
///
/// `weaknesses` and `resistances` are derived from `types` at construction and are
/// always disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Lower-cased identifier
    pub name: String,
    /// Category tags in the order the source lists them (raw, may include unknown tags)
    pub types: Vec<String>,
    pub stats: BaseStats,
    pub weaknesses: BTreeSet<Category>,
    pub resistances: BTreeSet<Category>,
}

impl EntityRecord {
    /// Known categories among this record's tags, in tag order.
    pub fn categories(&self) -> Vec<Category> {
        self.types
            .iter()
            .filter_map(|t| t.parse::<Category>().ok())
            .collect()
    }

    /// Whether the derived sets honour the disjointness invariant.
    pub fn is_consistent(&self) -> bool {
        self.weaknesses.is_disjoint(&self.resistances)
    }
}

// ============= Fetch Outcomes =============

/// Result of a data-source lookup.
///
/// Keeps "the source says it doesn't exist" apart from "we could not reach the
/// source", so neither can be mistaken for data.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Found(T),
    NotFound,
    TransientFailure { attempts: u32, last_error: String },
}

impl<T> FetchOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found(_))
    }

    /// Collapse both failure arms to `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            FetchOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> FetchOutcome<&T> {
        match self {
            FetchOutcome::Found(value) => FetchOutcome::Found(value),
            FetchOutcome::NotFound => FetchOutcome::NotFound,
            FetchOutcome::TransientFailure {
                attempts,
                last_error,
            } => FetchOutcome::TransientFailure {
                attempts: *attempts,
                last_error: last_error.clone(),
            },
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
