//! Circular layout for the node-graph view.

use crate::model::{Entity, EntityIndex, RelationshipKind};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use super::PairSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Entity,
    Junction,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub entity_name: String,
    pub field_count: usize,
    pub relationship_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub data: NodeData,
    pub position: Position,
}

/// Edges carry the raw relationship kind; unlike ER connections there is no
/// many-to-many refinement at this level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeGraphData {
    pub nodes: Vec<NodeGraphNode>,
    pub edges: Vec<NodeGraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphLayout {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl Default for GraphLayout {
    fn default() -> Self {
        Self {
            center_x: 400.0,
            center_y: 400.0,
            radius: 300.0,
        }
    }
}

impl GraphLayout {
    pub fn layout(&self, entities: &[Entity]) -> NodeGraphData {
        if entities.is_empty() {
            return NodeGraphData::default();
        }

        let index = EntityIndex::new(entities);
        let angle_step = 2.0 * PI / entities.len() as f64;

        let mut nodes = Vec::with_capacity(entities.len());
        let mut edges = Vec::new();
        let mut connected = PairSet::default();

        for (i, entity) in entities.iter().enumerate() {
            nodes.push(NodeGraphNode {
                id: entity.name.clone(),
                label: entity.name.clone(),
                kind: if entity.is_junction_table {
                    NodeKind::Junction
                } else {
                    NodeKind::Entity
                },
                data: NodeData {
                    entity_name: entity.name.clone(),
                    field_count: entity.fields.len(),
                    relationship_count: entity.relationships.len(),
                },
                position: self.position(i, entities.len(), angle_step),
            });

            for rel in &entity.relationships {
                if index.get(&rel.target_entity).is_none() {
                    debug!(
                        entity = %entity.name,
                        target = %rel.target_entity,
                        "dropping edge to unknown entity"
                    );
                    continue;
                }

                if !connected.insert(&entity.name, &rel.target_entity) {
                    continue;
                }

                edges.push(NodeGraphEdge {
                    id: format!("{}-{}-{}", entity.name, rel.target_entity, rel.field_name),
                    source: entity.name.clone(),
                    target: rel.target_entity.clone(),
                    label: rel.kind.to_string(),
                    kind: rel.kind,
                });
            }
        }

        NodeGraphData { nodes, edges }
    }

    /// A lone node sits at the center rather than on the circle.
    fn position(&self, index: usize, count: usize, angle_step: f64) -> Position {
        if count == 1 {
            return Position {
                x: self.center_x,
                y: self.center_y,
            };
        }

        let angle = index as f64 * angle_step;
        Position {
            x: self.center_x + self.radius * angle.cos(),
            y: self.center_y + self.radius * angle.sin(),
        }
    }
}

/// Circular node graph with default settings.
pub fn generate_node_graph(entities: &[Entity]) -> NodeGraphData {
    GraphLayout::default().layout(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::parse_schema;

    fn graph(source: &str) -> NodeGraphData {
        generate_node_graph(&parse_schema(source).unwrap())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_circular_positions() {
        let g = graph(
            "type A @model { id: ID! }\ntype B @model { id: ID! }\n\
             type C @model { id: ID! }\ntype D @model { id: ID! }",
        );

        let expected = [(700.0, 400.0), (400.0, 700.0), (100.0, 400.0), (400.0, 100.0)];
        for (node, (x, y)) in g.nodes.iter().zip(expected) {
            assert!(approx(node.position.x, x), "{} x={}", node.id, node.position.x);
            assert!(approx(node.position.y, y), "{} y={}", node.id, node.position.y);
        }
    }

    #[test]
    fn test_single_node_at_center() {
        let g = graph("type Solo @model { id: ID! }");
        assert_eq!(g.nodes.len(), 1);
        assert_eq!(g.nodes[0].position, Position { x: 400.0, y: 400.0 });
    }

    #[test]
    fn test_empty_input() {
        let g = generate_node_graph(&[]);
        assert!(g.nodes.is_empty());
        assert!(g.edges.is_empty());
    }

    #[test]
    fn test_mutual_pair_single_edge() {
        let g = graph(
            "type Author @model { id: ID!, name: String!, books: [Book] @hasMany }\n\
             type Book @model { id: ID!, title: String!, author: Author @belongsTo }",
        );

        assert_eq!(
            g.edges,
            vec![NodeGraphEdge {
                id: "Author-Book-books".into(),
                source: "Author".into(),
                target: "Book".into(),
                label: "hasMany".into(),
                kind: RelationshipKind::HasMany,
            }]
        );
    }

    #[test]
    fn test_node_kind_and_counts() {
        let g = graph(
            "type Product @model { id: ID!, name: String, features: [ProductFeature] @hasMany }\n\
             type ProductFeature @model { id: ID!, product: Product @belongsTo }",
        );

        assert_eq!(g.nodes[0].kind, NodeKind::Entity);
        assert_eq!(
            g.nodes[0].data,
            NodeData {
                entity_name: "Product".into(),
                field_count: 2,
                relationship_count: 1,
            }
        );
        assert_eq!(g.nodes[1].kind, NodeKind::Junction);
        // no many-to-many refinement on graph edges
        assert_eq!(g.edges[0].label, "hasMany");
    }

    #[test]
    fn test_dangling_reference_dropped() {
        let g = graph("type Post @model { id: ID!, blog: Blog @belongsTo }");
        assert_eq!(g.nodes.len(), 1);
        assert!(g.edges.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let entities = parse_schema(
            "type A @model { id: ID!, bs: [B] @hasMany }\ntype B @model { a: A @belongsTo }\ntype C @model { id: ID! }",
        )
        .unwrap();
        assert_eq!(generate_node_graph(&entities), generate_node_graph(&entities));
    }

    #[test]
    fn test_json_shape() {
        let g = graph("type ProductCatalog @model { id: ID! }\ntype Shop @model { id: ID! }");
        let json = serde_json::to_value(&g).unwrap();

        assert_eq!(json["nodes"][0]["type"], "junction");
        assert_eq!(json["nodes"][1]["type"], "entity");
        assert_eq!(json["nodes"][0]["data"]["entityName"], "ProductCatalog");
        assert_eq!(json["nodes"][0]["data"]["fieldCount"], 1);
        assert_eq!(json["nodes"][0]["position"]["x"], 700.0);
    }
}
