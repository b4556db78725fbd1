//! Fewest-turns routing on an occupancy grid.
//!
//! Every step costs 1, but the estimate between two cells is 1 when they
//! share a row or column and a huge constant otherwise. The search therefore
//! keeps running straight while the remaining cells line up with the goal and
//! only turns when forced, which favours routes with the fewest corners over
//! the shortest ones.

use super::astar::{AStar, SearchSpace};
use crate::error::RouteError;
use crate::grid::RoutingGrid;
use schem_common::geom::coord::GridCell;

/// Up, down, left, right.
const STEPS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

pub struct TurnMinimizing<'a, G: RoutingGrid + ?Sized> {
    grid: &'a G,
    start: GridCell,
    goal: GridCell,
    unaligned_cost: u64,
}

impl<'a, G: RoutingGrid + ?Sized> TurnMinimizing<'a, G> {
    /// `unaligned_cost` is raised to `width + height + 1` when smaller, so it
    /// always outweighs any difference in path length on this grid.
    pub fn new(grid: &'a G, start: GridCell, goal: GridCell, unaligned_cost: u64) -> Self {
        let floor = grid.width() as u64 + grid.height() as u64 + 1;
        Self {
            grid,
            start,
            goal,
            unaligned_cost: unaligned_cost.max(floor),
        }
    }

    pub fn unaligned_cost(&self) -> u64 {
        self.unaligned_cost
    }

    #[inline(always)]
    fn is_traversable(&self, cell: GridCell) -> bool {
        if self.grid.is_free(cell.x as i64, cell.y as i64) {
            return true;
        }
        // Endpoints may sit on occupied cells but never off the field.
        (cell == self.goal || cell == self.start) && self.grid.contains(cell)
    }
}

impl<G: RoutingGrid + ?Sized> SearchSpace for TurnMinimizing<'_, G> {
    type Node = GridCell;

    fn neighbors(&self, cell: GridCell) -> impl IntoIterator<Item = GridCell> {
        STEPS.into_iter().filter_map(move |(dx, dy)| {
            let next = GridCell::new(cell.x.checked_add(dx)?, cell.y.checked_add(dy)?);
            self.is_traversable(next).then_some(next)
        })
    }

    fn heuristic(&self, a: GridCell, b: GridCell) -> u64 {
        if a.is_aligned_with(b) {
            1
        } else {
            self.unaligned_cost
        }
    }

    fn edge_cost(&self, _a: GridCell, _b: GridCell) -> u64 {
        1
    }
}

/// Turn-minimizing router with reusable search buffers.
pub struct PathFinder {
    search: AStar<GridCell>,
    unaligned_cost: u64,
}

impl PathFinder {
    pub fn new(unaligned_cost: u64) -> Self {
        Self {
            search: AStar::new(),
            unaligned_cost,
        }
    }

    /// Cell-by-cell path from `start` to `goal`, both inclusive. The endpoints
    /// are traversable whatever the grid says about them.
    pub fn find_path<G: RoutingGrid + ?Sized>(
        &mut self,
        grid: &G,
        start: GridCell,
        goal: GridCell,
    ) -> Result<Vec<GridCell>, RouteError> {
        for cell in [start, goal] {
            if !grid.contains(cell) {
                return Err(RouteError::OutOfBounds {
                    cell,
                    width: grid.width(),
                    height: grid.height(),
                });
            }
        }

        let space = TurnMinimizing::new(grid, start, goal, self.unaligned_cost);
        let path = self.search.find_path(&space, start, goal);
        log::trace!(
            "{} -> {}: {} expansions",
            start,
            goal,
            self.search.expansions()
        );
        path.ok_or(RouteError::NoPathFound { start, goal })
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::OccupancyGrid;
    use crate::simplify::count_turns;

    fn c(x: i32, y: i32) -> GridCell {
        GridCell::new(x, y)
    }

    fn assert_valid(grid: &OccupancyGrid, path: &[GridCell]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1, "{:?}", path);
        }
        for cell in path {
            assert!(grid.contains(*cell));
        }
        for cell in &path[1..path.len() - 1] {
            assert!(grid.is_free(cell.x as i64, cell.y as i64), "{} occupied", cell);
        }
    }

    #[test]
    fn straight_run_on_free_grid() {
        let grid = OccupancyGrid::new(10, 10).unwrap();
        let path = PathFinder::default()
            .find_path(&grid, c(0, 0), c(0, 9))
            .unwrap();
        assert_eq!(path.len(), 10);
        assert!(path.iter().all(|p| p.x == 0));
    }

    #[test]
    fn open_field_route_turns_once() {
        let grid = OccupancyGrid::new(12, 12).unwrap();
        let path = PathFinder::default()
            .find_path(&grid, c(1, 2), c(9, 7))
            .unwrap();
        assert_valid(&grid, &path);
        assert_eq!(path.len(), 14);
        assert_eq!(count_turns(&path), 1);
    }

    #[test]
    fn start_equal_to_goal() {
        let grid = OccupancyGrid::new(3, 3).unwrap();
        let path = PathFinder::default()
            .find_path(&grid, c(1, 1), c(1, 1))
            .unwrap();
        assert_eq!(path, vec![c(1, 1)]);
    }

    #[test]
    fn occupied_endpoints_are_traversable() {
        let mut grid = OccupancyGrid::new(5, 1).unwrap();
        grid.mark_occupied(0, 0);
        grid.mark_occupied(4, 0);
        let path = PathFinder::default()
            .find_path(&grid, c(0, 0), c(4, 0))
            .unwrap();
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn enclosed_goal_has_no_path() {
        let mut grid = OccupancyGrid::new(5, 5).unwrap();
        for (x, y) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            grid.mark_occupied(x, y);
        }
        assert_eq!(
            PathFinder::default().find_path(&grid, c(0, 0), c(2, 2)),
            Err(RouteError::NoPathFound {
                start: c(0, 0),
                goal: c(2, 2)
            })
        );
    }

    #[test]
    fn endpoints_outside_the_field_are_rejected() {
        let grid = OccupancyGrid::new(4, 4).unwrap();
        assert!(matches!(
            PathFinder::default().find_path(&grid, c(0, 0), c(4, 1)),
            Err(RouteError::OutOfBounds { cell, .. }) if cell == c(4, 1)
        ));
    }

    #[test]
    fn detour_around_a_wall() {
        // Wall across y = 2 with a single gap at x = 4.
        let mut grid = OccupancyGrid::new(5, 5).unwrap();
        for x in 0..4 {
            grid.mark_occupied(x, 2);
        }
        let path = PathFinder::default()
            .find_path(&grid, c(0, 0), c(0, 4))
            .unwrap();
        assert_valid(&grid, &path);
        assert!(path.contains(&c(4, 2)));
        assert!(count_turns(&path) <= 4);
    }

    #[test]
    fn small_sentinel_is_raised_above_grid_size() {
        let grid = OccupancyGrid::new(30, 20).unwrap();
        let space = TurnMinimizing::new(&grid, c(0, 0), c(1, 1), 2);
        assert_eq!(space.unaligned_cost(), 51);
        assert_eq!(space.heuristic(c(3, 3), c(3, 9)), 1);
        assert_eq!(space.heuristic(c(3, 3), c(4, 9)), 51);
    }

    #[test]
    fn neighbors_skip_occupied_and_off_field_cells() {
        let mut grid = OccupancyGrid::new(3, 3).unwrap();
        grid.mark_occupied(1, 0);
        let space = TurnMinimizing::new(&grid, c(2, 2), c(2, 1), 100_000);
        let around_origin: Vec<_> = space.neighbors(c(0, 0)).into_iter().collect();
        assert_eq!(around_origin, vec![c(0, 1)]);
    }

    #[test]
    fn endpoint_exemption_stops_at_the_field_edge() {
        let mut grid = OccupancyGrid::new(3, 3).unwrap();
        grid.mark_occupied(0, 0);
        let space = TurnMinimizing::new(&grid, c(0, 0), c(2, 2), 100_000);
        let next_to_start: Vec<_> = space.neighbors(c(1, 0)).into_iter().collect();
        assert_eq!(next_to_start, vec![c(1, 1), c(0, 0), c(2, 0)]);

        let off_field = TurnMinimizing::new(&grid, c(-1, 1), c(2, 2), 100_000);
        let at_edge: Vec<_> = off_field.neighbors(c(0, 1)).into_iter().collect();
        assert_eq!(at_edge, vec![c(0, 2), c(1, 1)]);
    }
}
