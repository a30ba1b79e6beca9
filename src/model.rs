//! Entity model derived from `@model` types.
//!
//! Entities refer to each other by name only; the entity list acts as the
//! arena and lookups go through [`EntityIndex`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub required: bool,
    pub is_list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    HasMany,
    BelongsTo,
}

impl RelationshipKind {
    /// Directive name that marks a field with this kind.
    pub fn directive(self) -> &'static str {
        match self {
            Self::HasMany => "hasMany",
            Self::BelongsTo => "belongsTo",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub target_entity: String,
    pub field_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
    pub is_junction_table: bool,
}

/// Name -> entity lookup over a borrowed entity list.
pub struct EntityIndex<'a> {
    by_name: HashMap<&'a str, &'a Entity>,
}

impl<'a> EntityIndex<'a> {
    pub fn new(entities: &'a [Entity]) -> Self {
        Self {
            by_name: entities.iter().map(|e| (e.name.as_str(), e)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a Entity> {
        self.by_name.get(name).copied()
    }
}

/// Naming-convention heuristic for many-to-many association types: the name
/// mentions `Product` together with one of the known partner concepts.
///
/// This only recognises the conventions of the schemas it was written for
/// and says nothing about the entity's structure.
pub fn is_junction_table(name: &str) -> bool {
    const PARTNERS: [&str; 4] = ["Industry", "ClientNeed", "Feature", "Catalog"];

    name.contains("Product") && PARTNERS.iter().any(|p| name.contains(p))
}
