mod erd;
mod graph;

pub use erd::{
    ConnectionKind, ErdBounds, ErdConnection, ErdDiagram, ErdLayout, ErdTable,
    generate_erd_diagram,
};
pub use graph::{
    GraphLayout, NodeData, NodeGraphData, NodeGraphEdge, NodeGraphNode, NodeKind, Position,
    generate_node_graph,
};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Settings for both layouts. Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub erd: ErdLayout,
    pub graph: GraphLayout,
}

impl LayoutConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Unordered entity-name pairs that already have a connection.
#[derive(Default)]
struct PairSet {
    pairs: HashSet<(String, String)>,
}

impl PairSet {
    /// Returns false if `(a, b)` or `(b, a)` was inserted before.
    fn insert(&mut self, a: &str, b: &str) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.pairs.insert((key.0.to_string(), key.1.to_string()))
    }
}
