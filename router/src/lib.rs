pub mod algo;
pub mod context;
pub mod error;
pub mod grid;
pub mod simplify;
pub mod utils;
pub mod wire;

pub use error::RouteError;
pub use wire::{Route, RouteState, RoutedWire};

use rayon::prelude::*;
use schem_common::db::core::Circuit;
use schem_common::db::indices::ComponentId;
use schem_common::geom::point::Point;
use schem_common::util::config::RoutingConfig;

/// Builds one routed wire per dynamic wire in the circuit and refreshes them
/// all. Each wire owns its grid, so they route in parallel.
pub fn route_all(circuit: &Circuit, config: &RoutingConfig) -> Result<Vec<RoutedWire>, RouteError> {
    let mut wires: Vec<RoutedWire> = circuit
        .components()
        .filter(|(_, c)| c.kind.is_routed())
        .map(|(id, c)| RoutedWire::new(id, c.nodes, config))
        .collect();

    wires.par_iter_mut().try_for_each(|w| w.refresh(circuit))?;

    let fallback = wires
        .iter()
        .filter(|w| w.route().is_ok_and(|r| r.is_fallback))
        .count();
    log::info!("Routed {} wires ({} fallback)", wires.len(), fallback);
    Ok(wires)
}

/// Turns every routed wire into static wires. Returns how many were created.
/// Stops at the first wire that fails to commit; wires before it stay
/// committed and the failing one is rolled back to its routed entity.
pub fn commit_all(circuit: &mut Circuit, wires: Vec<RoutedWire>) -> Result<usize, RouteError> {
    let mut created = 0;
    for wire in wires {
        created += wire.materialize(circuit)?.len();
    }
    Ok(created)
}

/// The entity under the pointer. Routed wires are tested first since they
/// are drawn on top; other components are found through their bounding boxes.
pub fn pick(circuit: &Circuit, wires: &[RoutedWire], x: f64, y: f64) -> Option<ComponentId> {
    if let Some(wire) = wires
        .iter()
        .find(|w| w.contains_point(x, y).unwrap_or(false))
    {
        return Some(wire.id());
    }
    circuit
        .spatial_index()
        .query_point(Point::new(x, y))
        .into_iter()
        .filter(|&id| circuit.component(id).is_some_and(|c| !c.kind.is_routed()))
        .min()
}
