use crate::wire::{EntityFactory, RoutingContext};
use schem_common::db::core::{Circuit, CircuitError, ComponentKind, PlacedComponent};
use schem_common::db::indices::{ComponentId, NodeId};
use schem_common::geom::point::Point;

impl RoutingContext for Circuit {
    type Obstacle<'a> = PlacedComponent<'a>;

    fn canvas_size(&self) -> (i64, i64) {
        (self.width as i64, self.height as i64)
    }

    /// Routed wires have no footprint of their own and never block.
    fn obstacles(&self) -> impl Iterator<Item = PlacedComponent<'_>> {
        self.placed().filter(|p| !p.data.kind.is_routed())
    }

    fn endpoint(&self, node: NodeId) -> Option<Point<f64>> {
        self.node_position(node)
    }
}

impl EntityFactory for Circuit {
    type Error = CircuitError;

    fn create_wire(&mut self, start: Point<f64>, end: Point<f64>) -> Result<ComponentId, CircuitError> {
        let a = self.node_at_or_insert(start)?;
        let b = self.node_at_or_insert(end)?;
        self.add_component(None, ComponentKind::Wire, [a, b], None)
    }

    fn delete(&mut self, id: ComponentId) -> Result<(), CircuitError> {
        Circuit::delete(self, id)
            .map(|_| ())
            .ok_or(CircuitError::UnknownComponent(id))
    }
}
