use crate::grid::{OccupancyGrid, RoutingGrid};
use crate::simplify::expand_waypoints;
use crate::wire::{Route, RoutedWire, RoutingContext};
use rayon::prelude::*;
use schem_common::geom::coord::GridCell;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub routed: usize,
    pub fallback: usize,
}

/// Verifies every fresh wire against the grid it was routed on: consecutive
/// waypoints are axis aligned, the route stays on the field, starts and ends
/// on the wire's endpoint cells and no interior cell is occupied. Fallback
/// routes are counted but not checked for obstacles.
pub fn run<C>(ctx: &C, wires: &[RoutedWire]) -> Result<CheckSummary, String>
where
    C: RoutingContext + Sync + ?Sized,
{
    log::info!("Verifying {} routed wires...", wires.len());

    let results: Vec<Result<bool, String>> = wires.par_iter().map(|w| check_wire(ctx, w)).collect();

    let mut summary = CheckSummary::default();
    let mut msgs = Vec::new();
    for result in results {
        match result {
            Ok(true) => summary.fallback += 1,
            Ok(false) => summary.routed += 1,
            Err(e) => {
                log::error!("\x1b[31mFAIL\x1b[0m: {}", e);
                msgs.push(e);
            }
        }
    }

    if summary.fallback > 0 {
        log::warn!(
            "{} wire(s) fell back to a direct line through obstacles",
            summary.fallback
        );
    }

    if msgs.is_empty() {
        log::info!(
            "\x1b[32mPASS\x1b[0m: {} routes valid ({} fallback)",
            summary.routed + summary.fallback,
            summary.fallback
        );
        Ok(summary)
    } else {
        Err(msgs.join("; "))
    }
}

/// `Ok(true)` marks a fallback route.
fn check_wire<C: RoutingContext + ?Sized>(ctx: &C, wire: &RoutedWire) -> Result<bool, String> {
    let id = wire.id();
    let route = wire.route().map_err(|e| format!("{}: {}", id, e))?;
    let [a, b] = wire.endpoints();
    let expected = [a, b].map(|n| ctx.endpoint(n).and_then(GridCell::from_point));
    check_route(route, expected, wire.grid()).map_err(|e| format!("{}: {}", id, e))
}

fn check_route(
    route: &Route,
    expected: [Option<GridCell>; 2],
    grid: &OccupancyGrid,
) -> Result<bool, String> {
    if route.waypoints.first().copied() != expected[0] || route.waypoints.last().copied() != expected[1] {
        return Err("route does not join its endpoints".to_string());
    }

    if route.is_fallback {
        return Ok(true);
    }

    let cells = expand_waypoints(&route.waypoints)
        .ok_or_else(|| "diagonal step between waypoints".to_string())?;
    if let Some(cell) = cells.iter().find(|c| !grid.contains(**c)) {
        return Err(format!("cell {} off the field", cell));
    }
    let interior = &cells[1..cells.len().saturating_sub(1).max(1)];
    if let Some(cell) = interior
        .iter()
        .find(|c| !grid.is_free(c.x as i64, c.y as i64))
    {
        return Err(format!("crosses occupied cell {}", cell));
    }
    Ok(false)
}
