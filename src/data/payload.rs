//! Wire shapes of the data source.
//!
//! Every field is defaulted so that partial payloads still deserialize. When
//! the name is missing the client keeps the identifier it asked for.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    #[serde(default)]
    pub slot: u32,
    #[serde(rename = "type", default)]
    pub kind: NamedRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatEntry {
    #[serde(default)]
    pub base_stat: u32,
    #[serde(default)]
    pub stat: NamedRef,
}

/// `GET /pokemon/{name}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
}

impl EntityPayload {
    /// Type names ordered by slot, empty names dropped.
    pub fn type_names(&self) -> Vec<String> {
        let mut slots: Vec<&TypeSlot> = self.types.iter().collect();
        slots.sort_by_key(|t| t.slot);
        slots
            .into_iter()
            .map(|t| t.kind.name.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryMember {
    #[serde(default)]
    pub pokemon: NamedRef,
}

/// `GET /type/{category}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pokemon: Vec<CategoryMember>,
}

impl CategoryPayload {
    /// Member identifiers in response order.
    pub fn member_names(&self) -> Vec<String> {
        self.pokemon
            .iter()
            .map(|m| m.pokemon.name.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect()
    }
}
