//! Reduction of cell-by-cell paths to their corner cells.

use schem_common::geom::coord::GridCell;

/// Keeps the first and last cell and every interior cell where the path
/// changes direction. Paths of one or two cells come back unchanged.
pub fn simplify_path(path: &[GridCell]) -> Vec<GridCell> {
    let Some((&first, rest)) = path.split_first() else {
        return Vec::new();
    };
    let mut simplified = vec![first];
    for w in path.windows(3) {
        let (prev, current, next) = (w[0], w[1], w[2]);
        let same_x = prev.x == current.x && current.x == next.x;
        let same_y = prev.y == current.y && current.y == next.y;
        if !same_x && !same_y {
            simplified.push(current);
        }
    }
    if let Some(&last) = rest.last() {
        simplified.push(last);
    }
    simplified
}

/// Walks straight between consecutive waypoints, re-creating every cell.
/// Returns `None` if two consecutive waypoints share neither row nor column.
pub fn expand_waypoints(waypoints: &[GridCell]) -> Option<Vec<GridCell>> {
    let Some(&first) = waypoints.first() else {
        return Some(Vec::new());
    };
    let mut cells = vec![first];
    for pair in waypoints.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if !from.is_aligned_with(to) {
            return None;
        }
        let mut at = from;
        while at != to {
            at = GridCell::new(step_toward(at.x, to.x), step_toward(at.y, to.y));
            cells.push(at);
        }
    }
    Some(cells)
}

#[inline]
fn step_toward(from: i32, to: i32) -> i32 {
    match from.cmp(&to) {
        std::cmp::Ordering::Less => from + 1,
        std::cmp::Ordering::Greater => from - 1,
        std::cmp::Ordering::Equal => from,
    }
}

/// Direction changes between horizontal and vertical along a cell path.
pub fn count_turns(path: &[GridCell]) -> usize {
    path.windows(3)
        .filter(|w| {
            let first_horizontal = w[0].y == w[1].y;
            let second_horizontal = w[1].y == w[2].y;
            first_horizontal != second_horizontal
        })
        .count()
}
