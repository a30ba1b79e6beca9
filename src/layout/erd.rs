//! Grid layout for the table-based ER diagram.

use crate::measure::TableMetrics;
use crate::model::{Entity, EntityIndex, Field, Relationship, RelationshipKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::PairSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    #[serde(rename = "one-to-many")]
    OneToMany,
    #[serde(rename = "many-to-many")]
    ManyToMany,
    #[serde(rename = "belongsTo")]
    BelongsTo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErdTable {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErdConnection {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    pub from_field: String,
}

/// Padded bounding box of all tables, plus the canvas size a renderer should use.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErdBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErdDiagram {
    pub tables: Vec<ErdTable>,
    pub connections: Vec<ErdConnection>,
    pub bounds: ErdBounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErdLayout {
    pub start_x: f64,
    pub start_y: f64,
    /// Distance between grid cells, both axes
    pub spacing: f64,
    /// Margin added around the tables' bounding box
    pub padding: f64,
    pub min_canvas_width: f64,
    pub min_canvas_height: f64,
    pub metrics: TableMetrics,
}

impl Default for ErdLayout {
    fn default() -> Self {
        Self {
            start_x: 100.0,
            start_y: 100.0,
            spacing: 300.0,
            padding: 50.0,
            min_canvas_width: 1200.0,
            min_canvas_height: 800.0,
            metrics: TableMetrics::default(),
        }
    }
}

impl ErdLayout {
    pub fn layout(&self, entities: &[Entity]) -> ErdDiagram {
        if entities.is_empty() {
            return ErdDiagram::default();
        }

        let cols = (entities.len() as f64).sqrt().ceil() as usize;
        let index = EntityIndex::new(entities);

        let mut tables = Vec::with_capacity(entities.len());
        let mut connections = Vec::new();
        let mut connected = PairSet::default();

        for (i, entity) in entities.iter().enumerate() {
            let col = i % cols;
            let row = i / cols;
            let (width, height) = self.metrics.table_size(entity);

            tables.push(ErdTable {
                id: entity.name.clone(),
                name: entity.name.clone(),
                x: self.start_x + col as f64 * self.spacing,
                y: self.start_y + row as f64 * self.spacing,
                width,
                height,
                fields: entity.fields.clone(),
                relationships: entity.relationships.clone(),
            });

            for rel in &entity.relationships {
                let Some(target) = index.get(&rel.target_entity) else {
                    debug!(
                        entity = %entity.name,
                        target = %rel.target_entity,
                        field = %rel.field_name,
                        "dropping relationship to unknown entity"
                    );
                    continue;
                };

                if !connected.insert(&entity.name, &target.name) {
                    continue;
                }

                let kind = match rel.kind {
                    RelationshipKind::BelongsTo => ConnectionKind::BelongsTo,
                    RelationshipKind::HasMany
                        if entity.is_junction_table || target.is_junction_table =>
                    {
                        ConnectionKind::ManyToMany
                    }
                    RelationshipKind::HasMany => ConnectionKind::OneToMany,
                };

                connections.push(ErdConnection {
                    id: format!("{}-{}-{}", entity.name, rel.target_entity, rel.field_name),
                    from: entity.name.clone(),
                    to: rel.target_entity.clone(),
                    kind,
                    from_field: rel.field_name.clone(),
                });
            }
        }

        let bounds = self.bounds(&tables);

        ErdDiagram {
            tables,
            connections,
            bounds,
        }
    }

    fn bounds(&self, tables: &[ErdTable]) -> ErdBounds {
        if tables.is_empty() {
            return ErdBounds::default();
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for t in tables {
            min_x = min_x.min(t.x);
            min_y = min_y.min(t.y);
            max_x = max_x.max(t.x + t.width);
            max_y = max_y.max(t.y + t.height);
        }

        let width = max_x - min_x + self.padding * 2.0;
        let height = max_y - min_y + self.padding * 2.0;

        ErdBounds {
            min_x: min_x - self.padding,
            min_y: min_y - self.padding,
            width,
            height,
            canvas_width: width.max(self.min_canvas_width),
            canvas_height: height.max(self.min_canvas_height),
        }
    }
}

/// Grid-layout ER diagram with default settings.
pub fn generate_erd_diagram(entities: &[Entity]) -> ErdDiagram {
    ErdLayout::default().layout(entities)
}
