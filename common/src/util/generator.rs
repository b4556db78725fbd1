use crate::db::core::{Circuit, CircuitError, ComponentKind};
use crate::db::parser;
use crate::geom::point::Point;
use crate::geom::rect::Rect;
use rand::Rng;
use std::path::Path;

const PALETTE: [ComponentKind; 5] = [
    ComponentKind::Resistor,
    ComponentKind::Capacitor,
    ComponentKind::Inductor,
    ComponentKind::VoltageSource,
    ComponentKind::CurrentSource,
];

const MAX_PLACEMENT_ATTEMPTS: usize = 200;

/// Scatters non-overlapping two-terminal components over the canvas and joins
/// random terminals of different components with dynamic wires.
pub fn random_circuit<R: Rng>(
    rng: &mut R,
    width: u32,
    height: u32,
    num_components: usize,
    num_wires: usize,
) -> Result<Circuit, CircuitError> {
    let mut circuit = Circuit::new(width, height)?;
    let mut taken: Vec<Rect> = Vec::with_capacity(num_components);
    let mut terminals = Vec::with_capacity(num_components);

    for _ in 0..num_components {
        let kind = PALETTE[rng.gen_range(0..PALETTE.len())];
        let placed = (0..MAX_PLACEMENT_ATTEMPTS).find_map(|_| {
            let len = rng.gen_range(2..=3) as f64;
            let horizontal = rng.gen_bool(0.5);
            let (dx, dy) = if horizontal { (len, 0.0) } else { (0.0, len) };
            let max_x = width as f64 - 2.0 - dx;
            let max_y = height as f64 - 2.0 - dy;
            if max_x < 1.0 || max_y < 1.0 {
                return None;
            }
            let x = rng.gen_range(1..=max_x as u32) as f64;
            let y = rng.gen_range(1..=max_y as u32) as f64;
            let a = Point::new(x, y);
            let b = Point::new(x + dx, y + dy);
            // One free cell of clearance keeps every terminal reachable.
            let keepout = Rect::spanning(a, b).grow(kind.half_width() + 1.0);
            if taken.iter().any(|r| r.overlaps(&keepout)) {
                None
            } else {
                Some((a, b, keepout))
            }
        });
        let Some((a, b, keepout)) = placed else {
            log::warn!("Canvas full after {} components", terminals.len());
            break;
        };
        taken.push(keepout);
        let na = circuit.node_at_or_insert(a)?;
        let nb = circuit.node_at_or_insert(b)?;
        circuit.add_component(None, kind, [na, nb], None)?;
        terminals.push([na, nb]);
    }

    if terminals.len() >= 2 {
        for _ in 0..num_wires {
            let i = rng.gen_range(0..terminals.len());
            let mut j = rng.gen_range(0..terminals.len() - 1);
            if j >= i {
                j += 1;
            }
            let a = terminals[i][rng.gen_range(0..2)];
            let b = terminals[j][rng.gen_range(0..2)];
            circuit.add_component(None, ComponentKind::DynamicWire, [a, b], None)?;
        }
    }

    log::info!(
        "Generated circuit: {}x{} canvas, {} components, {} nodes",
        width,
        height,
        circuit.num_components(),
        circuit.num_nodes()
    );
    Ok(circuit)
}

pub fn generate_random_circuit(
    filename: &Path,
    width: u32,
    height: u32,
    num_components: usize,
    num_wires: usize,
) -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let circuit = random_circuit(&mut rng, width, height, num_components, num_wires)?;
    parser::circuit::save(&circuit, filename)?;
    Ok(())
}
