//! TOML circuit files.
//!
//! ```toml
//! [canvas]
//! width = 36
//! height = 22
//!
//! [[nodes]]
//! name = "1"
//! x = 2.0
//! y = 2.0
//!
//! [[components]]
//! name = "R1"
//! kind = "resistor"
//! nodes = ["1", "2"]
//! value = "10k"
//! ```

use crate::db::core::{Circuit, CircuitError, ComponentKind};
use crate::geom::point::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct CircuitFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    canvas: Option<CanvasSection>,
    #[serde(default)]
    nodes: Vec<NodeEntry>,
    #[serde(default)]
    components: Vec<ComponentEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CanvasSection {
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeEntry {
    name: String,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ComponentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    kind: ComponentKind,
    nodes: [String; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

/// Builds a circuit from file text. `default_canvas` applies when the file
/// has no `[canvas]` table.
pub fn parse(text: &str, default_canvas: (u32, u32)) -> Result<Circuit, CircuitError> {
    let file: CircuitFile = toml::from_str(text)?;
    let (width, height) = file
        .canvas
        .map(|c| (c.width, c.height))
        .unwrap_or(default_canvas);

    let mut circuit = Circuit::new(width, height)?;
    for node in file.nodes {
        circuit.add_node(node.name, Point::new(node.x, node.y))?;
    }
    for entry in file.components {
        let [a, b] = entry.nodes;
        let a = *circuit
            .node_name_map
            .get(&a)
            .ok_or(CircuitError::UnknownNode(a))?;
        let b = *circuit
            .node_name_map
            .get(&b)
            .ok_or(CircuitError::UnknownNode(b))?;
        circuit.add_component(entry.name, entry.kind, [a, b], entry.value)?;
    }
    log::debug!(
        "Parsed circuit: {}x{} canvas, {} nodes, {} components",
        circuit.width,
        circuit.height,
        circuit.num_nodes(),
        circuit.num_components()
    );
    Ok(circuit)
}

pub fn load(path: &Path, default_canvas: (u32, u32)) -> Result<Circuit, CircuitError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text, default_canvas)
}

pub fn to_string(circuit: &Circuit) -> Result<String, CircuitError> {
    let file = CircuitFile {
        canvas: Some(CanvasSection {
            width: circuit.width,
            height: circuit.height,
        }),
        nodes: circuit
            .nodes
            .iter()
            .map(|n| NodeEntry {
                name: n.name.clone(),
                x: n.position.x,
                y: n.position.y,
            })
            .collect(),
        components: circuit
            .components()
            .map(|(_, c)| ComponentEntry {
                name: Some(c.name.clone()),
                kind: c.kind,
                nodes: c.nodes.map(|n| circuit.nodes[n.index()].name.clone()),
                value: c.value.clone(),
            })
            .collect(),
    };
    Ok(toml::to_string_pretty(&file)?)
}

pub fn save(circuit: &Circuit, path: &Path) -> Result<(), CircuitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, to_string(circuit)?)?;
    Ok(())
}
