use crate::db::indices::*;
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use crate::geom::rtree::SpatialIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Positions closer than this are the same node.
const NODE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },
    #[error("node '{name}' has a non-finite position")]
    InvalidPosition { name: String },
    #[error("canvas must be at least 1x1, got {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed circuit file: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("failed to encode circuit: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    Opamp,
    Port,
    Wire,
    DynamicWire,
}

impl ComponentKind {
    /// Netlist name prefix used when a component is created without a name.
    pub fn prefix(&self) -> &'static str {
        match self {
            ComponentKind::Resistor => "R",
            ComponentKind::Capacitor => "C",
            ComponentKind::Inductor => "L",
            ComponentKind::VoltageSource => "V",
            ComponentKind::CurrentSource => "I",
            ComponentKind::Opamp => "E",
            ComponentKind::Port => "P",
            ComponentKind::Wire => "W",
            ComponentKind::DynamicWire => "DW",
        }
    }

    /// How far the drawn symbol extends on each side of the line between
    /// its two nodes.
    pub fn half_width(&self) -> f64 {
        match self {
            ComponentKind::Resistor | ComponentKind::Capacitor | ComponentKind::Inductor => 0.25,
            ComponentKind::VoltageSource | ComponentKind::CurrentSource => 0.5,
            ComponentKind::Opamp => 1.0,
            ComponentKind::Port | ComponentKind::Wire | ComponentKind::DynamicWire => 0.0,
        }
    }

    /// Routed wires have no footprint until a route exists.
    pub fn is_routed(&self) -> bool {
        matches!(self, ComponentKind::DynamicWire)
    }
}

#[derive(Clone, Debug)]
pub struct NodeData {
    pub name: String,
    pub position: Point<f64>,
}

#[derive(Clone, Debug)]
pub struct ComponentData {
    pub name: String,
    pub kind: ComponentKind,
    pub nodes: [NodeId; 2],
    pub value: Option<String>,
}

/// A live component together with its current bounding box.
#[derive(Clone, Copy, Debug)]
pub struct PlacedComponent<'a> {
    pub id: ComponentId,
    pub data: &'a ComponentData,
    pub bbox: Rect,
}

impl PlacedComponent<'_> {
    pub fn is_within_bbox(&self, x: f64, y: f64) -> bool {
        self.bbox.contains(Point::new(x, y))
    }
}

/// Placed components and the nodes joining them, on a canvas of
/// `width x height` grid units.
pub struct Circuit {
    pub width: u32,
    pub height: u32,
    pub nodes: Vec<NodeData>,
    components: Vec<Option<ComponentData>>,

    pub node_name_map: HashMap<String, NodeId>,
    pub component_name_map: HashMap<String, ComponentId>,
}

impl Circuit {
    pub fn new(width: u32, height: u32) -> Result<Self, CircuitError> {
        if width == 0 || height == 0 {
            return Err(CircuitError::InvalidCanvas { width, height });
        }
        Ok(Self {
            width,
            height,
            nodes: Vec::new(),
            components: Vec::new(),
            node_name_map: HashMap::new(),
            component_name_map: HashMap::new(),
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Live components; deleted ones are not counted.
    pub fn num_components(&self) -> usize {
        self.components.iter().filter(|c| c.is_some()).count()
    }

    pub fn add_node(&mut self, name: String, position: Point<f64>) -> Result<NodeId, CircuitError> {
        if !position.x.is_finite() || !position.y.is_finite() {
            return Err(CircuitError::InvalidPosition { name });
        }
        if self.node_name_map.contains_key(&name) {
            return Err(CircuitError::DuplicateName { kind: "node", name });
        }
        let id = NodeId::new(self.nodes.len());
        self.node_name_map.insert(name.clone(), id);
        self.nodes.push(NodeData { name, position });
        Ok(id)
    }

    pub fn node_position(&self, id: NodeId) -> Option<Point<f64>> {
        self.nodes.get(id.index()).map(|n| n.position)
    }

    pub fn node_at(&self, position: Point<f64>) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.position.distance(position) < NODE_TOLERANCE)
            .map(NodeId::new)
    }

    /// Returns the node at `position`, creating a numbered one if none exists.
    pub fn node_at_or_insert(&mut self, position: Point<f64>) -> Result<NodeId, CircuitError> {
        if let Some(id) = self.node_at(position) {
            return Ok(id);
        }
        let mut n = self.nodes.len() + 1;
        while self.node_name_map.contains_key(&n.to_string()) {
            n += 1;
        }
        self.add_node(n.to_string(), position)
    }

    pub fn move_node(&mut self, id: NodeId, position: Point<f64>) -> Result<(), CircuitError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or_else(|| CircuitError::UnknownNode(id.to_string()))?;
        if !position.x.is_finite() || !position.y.is_finite() {
            return Err(CircuitError::InvalidPosition {
                name: node.name.clone(),
            });
        }
        node.position = position;
        Ok(())
    }

    /// Adds a component. Without a name one is derived from the kind prefix,
    /// e.g. `R3` or `DW1`.
    pub fn add_component(
        &mut self,
        name: Option<String>,
        kind: ComponentKind,
        nodes: [NodeId; 2],
        value: Option<String>,
    ) -> Result<ComponentId, CircuitError> {
        for node in nodes {
            if node.index() >= self.nodes.len() {
                return Err(CircuitError::UnknownNode(node.to_string()));
            }
        }
        let name = match name {
            Some(name) => {
                if self.component_name_map.contains_key(&name) {
                    return Err(CircuitError::DuplicateName {
                        kind: "component",
                        name,
                    });
                }
                name
            }
            None => self.next_name(kind),
        };
        let id = ComponentId::new(self.components.len());
        self.component_name_map.insert(name.clone(), id);
        self.components.push(Some(ComponentData {
            name,
            kind,
            nodes,
            value,
        }));
        Ok(id)
    }

    fn next_name(&self, kind: ComponentKind) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("{}{}", kind.prefix(), n);
            if !self.component_name_map.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Removes a component, leaving its id unused.
    pub fn delete(&mut self, id: ComponentId) -> Option<ComponentData> {
        let removed = self.components.get_mut(id.index())?.take()?;
        self.component_name_map.remove(&removed.name);
        Some(removed)
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentData> {
        self.components.get(id.index())?.as_ref()
    }

    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &ComponentData)> {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (ComponentId::new(i), c)))
    }

    pub fn bbox(&self, id: ComponentId) -> Option<Rect> {
        self.component(id).map(|c| self.bbox_of(c))
    }

    fn bbox_of(&self, c: &ComponentData) -> Rect {
        let a = self.nodes[c.nodes[0].index()].position;
        let b = self.nodes[c.nodes[1].index()].position;
        Rect::spanning(a, b).grow(c.kind.half_width())
    }

    pub fn is_within_bbox(&self, id: ComponentId, x: f64, y: f64) -> bool {
        self.bbox(id)
            .is_some_and(|bbox| bbox.contains(Point::new(x, y)))
    }

    /// Every live component with its bounding box.
    pub fn placed(&self) -> impl Iterator<Item = PlacedComponent<'_>> {
        self.components().map(|(id, data)| PlacedComponent {
            id,
            data,
            bbox: self.bbox_of(data),
        })
    }

    pub fn spatial_index(&self) -> SpatialIndex<ComponentId> {
        SpatialIndex::bulk_load(self.placed().map(|p| (p.bbox, p.id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_circuit() -> (Circuit, NodeId, NodeId) {
        let mut c = Circuit::new(10, 10).unwrap();
        let a = c.add_node("1".into(), Point::new(2.0, 2.0)).unwrap();
        let b = c.add_node("2".into(), Point::new(5.0, 2.0)).unwrap();
        (c, a, b)
    }

    #[test]
    fn auto_names_follow_kind_prefix() {
        let (mut c, a, b) = two_node_circuit();
        let r1 = c
            .add_component(None, ComponentKind::Resistor, [a, b], None)
            .unwrap();
        let dw = c
            .add_component(None, ComponentKind::DynamicWire, [a, b], None)
            .unwrap();
        let r2 = c
            .add_component(None, ComponentKind::Resistor, [a, b], None)
            .unwrap();
        assert_eq!(c.component(r1).unwrap().name, "R1");
        assert_eq!(c.component(dw).unwrap().name, "DW1");
        assert_eq!(c.component(r2).unwrap().name, "R2");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (mut c, a, b) = two_node_circuit();
        assert!(matches!(
            c.add_node("1".into(), Point::new(0.0, 0.0)),
            Err(CircuitError::DuplicateName { kind: "node", .. })
        ));
        c.add_component(Some("R1".into()), ComponentKind::Resistor, [a, b], None)
            .unwrap();
        assert!(
            c.add_component(Some("R1".into()), ComponentKind::Resistor, [a, b], None)
                .is_err()
        );
    }

    #[test]
    fn bbox_grows_by_symbol_half_width() {
        let (mut c, a, b) = two_node_circuit();
        let r = c
            .add_component(None, ComponentKind::Resistor, [a, b], None)
            .unwrap();
        assert!(c.is_within_bbox(r, 3.0, 2.0));
        assert!(c.is_within_bbox(r, 5.25, 2.25));
        assert!(!c.is_within_bbox(r, 3.0, 3.0));
        assert!(!c.is_within_bbox(r, 1.0, 2.0));
    }

    #[test]
    fn delete_leaves_tombstone() {
        let (mut c, a, b) = two_node_circuit();
        let r = c
            .add_component(None, ComponentKind::Resistor, [a, b], None)
            .unwrap();
        let w = c
            .add_component(None, ComponentKind::Wire, [a, b], None)
            .unwrap();
        assert_eq!(c.delete(r).unwrap().name, "R1");
        assert!(c.delete(r).is_none());
        assert_eq!(c.num_components(), 1);
        assert_eq!(c.component(w).unwrap().name, "W1");
        assert!(!c.component_name_map.contains_key("R1"));
    }

    #[test]
    fn node_at_or_insert_reuses_positions() {
        let (mut c, a, _) = two_node_circuit();
        assert_eq!(c.node_at_or_insert(Point::new(2.0, 2.0)).unwrap(), a);
        let n = c.node_at_or_insert(Point::new(7.0, 7.0)).unwrap();
        assert_eq!(c.nodes[n.index()].name, "3");
        assert_eq!(c.num_nodes(), 3);
    }

    #[test]
    fn spatial_index_covers_live_components() {
        let (mut c, a, b) = two_node_circuit();
        let r = c
            .add_component(None, ComponentKind::Resistor, [a, b], None)
            .unwrap();
        let index = c.spatial_index();
        assert_eq!(index.query_point(Point::new(4.0, 2.1)), vec![r]);
        assert!(index.query_point(Point::new(4.0, 4.0)).is_empty());
    }
}
