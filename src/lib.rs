pub mod ast;
pub mod cache;
pub mod extract;
pub mod fallback;
pub mod layout;
pub mod lexer;
pub mod measure;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod serializer;

use serde::Serialize;
use tracing::info;
use wasm_bindgen::prelude::*;

pub use cache::AnalysisCache;
pub use extract::{SchemaError, parse_schema};
pub use layout::{
    ErdDiagram, LayoutConfig, NodeGraphData, generate_erd_diagram, generate_node_graph,
};
pub use model::{Entity, Field, Relationship, RelationshipKind};
pub use serializer::export_schema;

/// Entities of one schema together with both of their layouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub entities: Vec<Entity>,
    pub erd: ErdDiagram,
    pub graph: NodeGraphData,
}

/// Run the whole pipeline with default layout settings.
pub fn analyze(source: &str) -> Result<Analysis, SchemaError> {
    analyze_with(source, &LayoutConfig::default())
}

pub fn analyze_with(source: &str, config: &LayoutConfig) -> Result<Analysis, SchemaError> {
    let entities = parse_schema(source)?;
    let erd = config.erd.layout(&entities);
    let graph = config.graph.layout(&entities);

    info!(
        entities = entities.len(),
        connections = erd.connections.len(),
        edges = graph.edges.len(),
        "analyzed schema"
    );

    Ok(Analysis {
        entities,
        erd,
        graph,
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Analyze SDL and return `{ entities, erd, graph }` as JSON
#[wasm_bindgen(js_name = "analyzeSchema")]
pub fn analyze_schema_json(source: &str) -> Result<String, String> {
    let analysis = analyze(source).map_err(|e| e.to_string())?;
    to_json(&analysis)
}

#[wasm_bindgen(js_name = "erdDiagram")]
pub fn erd_diagram_json(source: &str) -> Result<String, String> {
    let entities = parse_schema(source).map_err(|e| e.to_string())?;
    to_json(&generate_erd_diagram(&entities))
}

#[wasm_bindgen(js_name = "nodeGraph")]
pub fn node_graph_json(source: &str) -> Result<String, String> {
    let entities = parse_schema(source).map_err(|e| e.to_string())?;
    to_json(&generate_node_graph(&entities))
}

/// Normalize SDL to its `@model` entities only
#[wasm_bindgen(js_name = "exportSchema")]
pub fn export_schema_sdl(source: &str) -> Result<String, String> {
    let entities = parse_schema(source).map_err(|e| e.to_string())?;
    Ok(export_schema(&entities))
}
