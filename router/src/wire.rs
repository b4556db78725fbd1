//! The routed-wire entity: a wire between two nodes whose shape is found by
//! the router rather than drawn by hand.
//!
//! A wire starts [`RouteState::Stale`]. [`RoutedWire::refresh`] rebuilds its
//! private occupancy grid, searches, simplifies and caches the result, moving
//! it to [`RouteState::Fresh`]. Moving an endpoint or changing the layout must
//! be reported with [`RoutedWire::endpoint_moved`] or
//! [`RoutedWire::layout_changed`], which invalidate the cache. Queries on a
//! stale wire fail with [`RouteError::NotReady`]; they never refresh on their
//! own.

use crate::algo::PathFinder;
use crate::error::RouteError;
use crate::grid::{Obstacle, OccupancyGrid};
use crate::simplify::simplify_path;
use schem_common::db::indices::{ComponentId, NodeId};
use schem_common::geom::coord::GridCell;
use schem_common::geom::point::Point;
use schem_common::geom::segment::Segment;
use schem_common::util::config::RoutingConfig;

/// What a wire needs from the surrounding model to route itself.
pub trait RoutingContext {
    type Obstacle<'a>: Obstacle
    where
        Self: 'a;

    /// Field size in cells.
    fn canvas_size(&self) -> (i64, i64);
    /// Every placed entity that may block a route, the wire itself included.
    fn obstacles(&self) -> impl Iterator<Item = Self::Obstacle<'_>>;
    fn endpoint(&self, node: NodeId) -> Option<Point<f64>>;
}

/// Receives the static wires a routed wire turns into on commit.
pub trait EntityFactory {
    type Error: std::fmt::Display;

    fn create_wire(&mut self, start: Point<f64>, end: Point<f64>) -> Result<ComponentId, Self::Error>;
    fn delete(&mut self, id: ComponentId) -> Result<(), Self::Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Corner cells from the first endpoint to the second.
    pub waypoints: Vec<GridCell>,
    /// Set when no path existed and the route is a straight line that may
    /// cross obstacles.
    pub is_fallback: bool,
}

impl Route {
    fn direct(start: GridCell, goal: GridCell) -> Self {
        let waypoints = if start == goal {
            vec![start]
        } else {
            vec![start, goal]
        };
        Self {
            waypoints,
            is_fallback: true,
        }
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.waypoints
            .windows(2)
            .map(|w| Segment::new(w[0].to_point(), w[1].to_point()))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteState {
    Stale,
    Fresh(Route),
}

pub struct RoutedWire {
    id: ComponentId,
    endpoints: [NodeId; 2],
    simplify: bool,
    hit_threshold: f64,
    grid: OccupancyGrid,
    finder: PathFinder,
    state: RouteState,
}

impl RoutedWire {
    pub fn new(id: ComponentId, endpoints: [NodeId; 2], config: &RoutingConfig) -> Self {
        Self {
            id,
            endpoints,
            simplify: config.simplify_path,
            hit_threshold: config.hit_threshold,
            grid: OccupancyGrid::default(),
            finder: PathFinder::new(config.unaligned_cost),
            state: RouteState::Stale,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn endpoints(&self) -> [NodeId; 2] {
        self.endpoints
    }

    pub fn state(&self) -> &RouteState {
        &self.state
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self.state, RouteState::Fresh(_))
    }

    /// The grid the cached route was searched on.
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn endpoint_moved(&mut self) {
        self.state = RouteState::Stale;
    }

    pub fn layout_changed(&mut self) {
        self.state = RouteState::Stale;
    }

    fn endpoint_cell<C: RoutingContext + ?Sized>(
        &self,
        ctx: &C,
        node: NodeId,
    ) -> Result<GridCell, RouteError> {
        ctx.endpoint(node)
            .and_then(GridCell::from_point)
            .ok_or(RouteError::InvalidEndpoint(node))
    }

    /// Recomputes the route if stale; a fresh wire is left alone. A missing
    /// path degrades to a straight two-point route and is only logged.
    pub fn refresh<C: RoutingContext + ?Sized>(&mut self, ctx: &C) -> Result<(), RouteError> {
        if self.is_fresh() {
            return Ok(());
        }

        let start = self.endpoint_cell(ctx, self.endpoints[0])?;
        let goal = self.endpoint_cell(ctx, self.endpoints[1])?;
        let (width, height) = ctx.canvas_size();
        self.grid.rebuild(width, height, ctx.obstacles(), self.id)?;

        let route = match self.finder.find_path(&self.grid, start, goal) {
            Ok(path) => {
                let waypoints = if self.simplify {
                    simplify_path(&path)
                } else {
                    path
                };
                log::debug!(
                    "{}: routed {} -> {} through {} waypoints",
                    self.id,
                    start,
                    goal,
                    waypoints.len()
                );
                Route {
                    waypoints,
                    is_fallback: false,
                }
            }
            Err(e @ (RouteError::NoPathFound { .. } | RouteError::OutOfBounds { .. })) => {
                log::warn!("{}: {}; drawing a direct line", self.id, e);
                Route::direct(start, goal)
            }
            Err(e) => return Err(e),
        };
        self.state = RouteState::Fresh(route);
        Ok(())
    }

    pub fn route(&self) -> Result<&Route, RouteError> {
        match &self.state {
            RouteState::Fresh(route) => Ok(route),
            RouteState::Stale => Err(RouteError::NotReady),
        }
    }

    pub fn waypoints(&self) -> Result<&[GridCell], RouteError> {
        self.route().map(|r| r.waypoints.as_slice())
    }

    pub fn segments(&self) -> Result<Vec<Segment>, RouteError> {
        self.route().map(Route::segments)
    }

    /// Whether `(x, y)` lies within the hit threshold of the line through any
    /// segment. A single-cell route has no segments and is never hit.
    pub fn contains_point(&self, x: f64, y: f64) -> Result<bool, RouteError> {
        let route = self.route()?;
        let p = Point::new(x, y);
        Ok(route
            .segments()
            .iter()
            .any(|seg| seg.line_distance(p) < self.hit_threshold))
    }

    /// Replaces this wire by one static wire per segment, then asks the
    /// factory to delete it. If any factory call fails, the static wires
    /// created so far are deleted again and the routed entity is left in the
    /// model. The wire is consumed either way.
    pub fn materialize<F: EntityFactory + ?Sized>(
        self,
        factory: &mut F,
    ) -> Result<Vec<ComponentId>, RouteError> {
        let route = self.route()?;

        let mut created = Vec::with_capacity(route.waypoints.len().saturating_sub(1));
        for seg in route.segments() {
            match factory.create_wire(seg.p1, seg.p2) {
                Ok(id) => created.push(id),
                Err(e) => return Err(self.roll_back(factory, &created, e)),
            }
        }
        if let Err(e) = factory.delete(self.id) {
            return Err(self.roll_back(factory, &created, e));
        }
        log::debug!("{}: committed as {} wires", self.id, created.len());
        Ok(created)
    }

    fn roll_back<F: EntityFactory + ?Sized>(
        &self,
        factory: &mut F,
        created: &[ComponentId],
        cause: F::Error,
    ) -> RouteError {
        for &id in created.iter().rev() {
            if let Err(e) = factory.delete(id) {
                log::warn!("{}: could not remove partial wire {}: {}", self.id, id, e);
            }
        }
        RouteError::Commit(format!("{}: {}", self.id, cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Block {
        id: ComponentId,
        min: (f64, f64),
        max: (f64, f64),
    }

    impl Obstacle for Block {
        fn id(&self) -> ComponentId {
            self.id
        }
        fn is_within_bbox(&self, x: f64, y: f64) -> bool {
            x >= self.min.0 && x <= self.max.0 && y >= self.min.1 && y <= self.max.1
        }
    }

    struct Board {
        size: (i64, i64),
        blocks: Vec<Block>,
        ends: Vec<Point<f64>>,
    }

    impl Board {
        fn new(width: i64, height: i64, a: (f64, f64), b: (f64, f64)) -> Self {
            Self {
                size: (width, height),
                blocks: Vec::new(),
                ends: vec![Point::new(a.0, a.1), Point::new(b.0, b.1)],
            }
        }

        fn block(mut self, id: u32, min: (f64, f64), max: (f64, f64)) -> Self {
            self.blocks.push(Block {
                id: ComponentId(id),
                min,
                max,
            });
            self
        }
    }

    impl RoutingContext for Board {
        type Obstacle<'a> = &'a Block;

        fn canvas_size(&self) -> (i64, i64) {
            self.size
        }
        fn obstacles(&self) -> impl Iterator<Item = &Block> {
            self.blocks.iter()
        }
        fn endpoint(&self, node: NodeId) -> Option<Point<f64>> {
            self.ends.get(node.index()).copied()
        }
    }

    #[derive(Default)]
    struct Recorder {
        created: Vec<(Point<f64>, Point<f64>)>,
        deleted: Vec<ComponentId>,
        /// Fail every `create_wire` once this many wires exist.
        capacity: Option<usize>,
    }

    impl EntityFactory for Recorder {
        type Error = String;

        fn create_wire(&mut self, start: Point<f64>, end: Point<f64>) -> Result<ComponentId, String> {
            if self.capacity.is_some_and(|cap| self.created.len() >= cap) {
                return Err("factory full".to_string());
            }
            self.created.push((start, end));
            Ok(ComponentId::new(100 + self.created.len()))
        }
        fn delete(&mut self, id: ComponentId) -> Result<(), String> {
            self.deleted.push(id);
            Ok(())
        }
    }

    const SELF_ID: ComponentId = ComponentId(7);

    fn wire() -> RoutedWire {
        RoutedWire::new(SELF_ID, [NodeId(0), NodeId(1)], &RoutingConfig::default())
    }

    fn c(x: i32, y: i32) -> GridCell {
        GridCell::new(x, y)
    }

    #[test]
    fn new_wire_is_stale_and_not_ready() {
        let w = wire();
        assert_eq!(w.state(), &RouteState::Stale);
        assert_eq!(w.segments(), Err(RouteError::NotReady));
        assert_eq!(w.contains_point(0.0, 0.0), Err(RouteError::NotReady));
    }

    #[test]
    fn straight_vertical_route() {
        let board = Board::new(10, 10, (0.0, 0.0), (0.0, 9.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        assert!(w.is_fresh());
        assert_eq!(w.waypoints().unwrap(), &[c(0, 0), c(0, 9)]);
        let segments = w.segments().unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].p2, Point::new(0.0, 9.0));
    }

    #[test]
    fn endpoint_positions_are_truncated() {
        let board = Board::new(10, 10, (0.9, 0.2), (4.7, 0.99));
        let mut w = wire();
        w.refresh(&board).unwrap();
        assert_eq!(w.waypoints().unwrap(), &[c(0, 0), c(4, 0)]);
    }

    #[test]
    fn refresh_on_fresh_wire_is_a_no_op() {
        let mut board = Board::new(6, 6, (0.0, 2.0), (5.0, 2.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        let before = w.route().unwrap().clone();

        board = board.block(1, (2.0, 2.0), (2.0, 2.0));
        w.refresh(&board).unwrap();
        assert_eq!(w.route().unwrap(), &before);

        w.layout_changed();
        assert!(!w.is_fresh());
        w.refresh(&board).unwrap();
        let after = w.route().unwrap();
        assert_ne!(after, &before);
        assert!(!after.is_fallback);
        assert!(!after.waypoints.contains(&c(2, 2)));
    }

    #[test]
    fn moved_endpoint_reroutes() {
        let mut board = Board::new(8, 8, (1.0, 1.0), (6.0, 1.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        board.ends[1] = Point::new(1.0, 6.0);
        w.endpoint_moved();
        w.refresh(&board).unwrap();
        assert_eq!(w.waypoints().unwrap(), &[c(1, 1), c(1, 6)]);
    }

    #[test]
    fn enclosed_goal_falls_back_to_direct_line() {
        let board = Board::new(5, 5, (0.0, 0.0), (2.0, 2.0))
            .block(1, (1.0, 2.0), (1.0, 2.0))
            .block(2, (3.0, 2.0), (3.0, 2.0))
            .block(3, (2.0, 1.0), (2.0, 1.0))
            .block(4, (2.0, 3.0), (2.0, 3.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        let route = w.route().unwrap();
        assert!(route.is_fallback);
        assert_eq!(route.waypoints, vec![c(0, 0), c(2, 2)]);
    }

    #[test]
    fn endpoint_off_the_field_falls_back() {
        let board = Board::new(5, 5, (0.0, 0.0), (9.0, 0.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        let route = w.route().unwrap();
        assert!(route.is_fallback);
        assert_eq!(route.waypoints, vec![c(0, 0), c(9, 0)]);
    }

    #[test]
    fn degenerate_route_has_no_segments() {
        let board = Board::new(4, 4, (2.0, 2.0), (2.0, 2.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        assert_eq!(w.waypoints().unwrap(), &[c(2, 2)]);
        assert!(w.segments().unwrap().is_empty());
        assert_eq!(w.contains_point(2.0, 2.0), Ok(false));
    }

    #[test]
    fn own_footprint_never_blocks() {
        let board = Board::new(6, 3, (0.0, 1.0), (5.0, 1.0))
            .block(SELF_ID.0, (0.0, 0.0), (5.0, 2.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        assert_eq!(w.waypoints().unwrap(), &[c(0, 1), c(5, 1)]);
        assert_eq!(w.grid().occupied_count(), 0);
    }

    #[test]
    fn occupied_endpoints_are_reachable() {
        let board = Board::new(6, 3, (0.0, 1.0), (5.0, 1.0))
            .block(1, (0.0, 1.0), (0.0, 1.0))
            .block(2, (5.0, 1.0), (5.0, 1.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        assert!(!w.route().unwrap().is_fallback);
        assert_eq!(w.waypoints().unwrap(), &[c(0, 1), c(5, 1)]);
    }

    #[test]
    fn unsimplified_route_keeps_every_cell() {
        let board = Board::new(5, 5, (0.0, 0.0), (0.0, 3.0));
        let config = RoutingConfig {
            simplify_path: false,
            ..RoutingConfig::default()
        };
        let mut w = RoutedWire::new(SELF_ID, [NodeId(0), NodeId(1)], &config);
        w.refresh(&board).unwrap();
        assert_eq!(w.waypoints().unwrap().len(), 4);
        assert_eq!(w.segments().unwrap().len(), 3);
    }

    #[test]
    fn hit_test_uses_half_unit_threshold() {
        let board = Board::new(6, 1, (0.0, 0.0), (5.0, 0.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        assert_eq!(w.waypoints().unwrap(), &[c(0, 0), c(5, 0)]);
        assert_eq!(w.contains_point(2.0, 0.0), Ok(true));
        assert_eq!(w.contains_point(2.0, 0.4), Ok(true));
        assert_eq!(w.contains_point(2.0, 2.0), Ok(false));
        assert_eq!(w.contains_point(2.0, 0.5), Ok(false));
    }

    #[test]
    fn invalid_canvas_is_reported_and_wire_stays_stale() {
        let board = Board::new(-1, 5, (0.0, 0.0), (0.0, 3.0));
        let mut w = wire();
        assert_eq!(
            w.refresh(&board),
            Err(RouteError::InvalidDimension {
                width: -1,
                height: 5
            })
        );
        assert!(!w.is_fresh());
    }

    #[test]
    fn unknown_endpoint_is_reported() {
        let mut board = Board::new(5, 5, (0.0, 0.0), (0.0, 3.0));
        board.ends.pop();
        let mut w = wire();
        assert_eq!(w.refresh(&board), Err(RouteError::InvalidEndpoint(NodeId(1))));
    }

    #[test]
    fn materialize_emits_one_wire_per_segment_then_deletes() {
        let board = Board::new(6, 6, (0.0, 0.0), (4.0, 3.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        let waypoints = w.waypoints().unwrap().to_vec();
        assert_eq!(waypoints.len(), 3);

        let mut recorder = Recorder::default();
        let created = w.materialize(&mut recorder).unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(recorder.created[0].0, waypoints[0].to_point());
        assert_eq!(recorder.created[1].1, waypoints[2].to_point());
        assert_eq!(recorder.deleted, vec![SELF_ID]);
    }

    #[test]
    fn stale_wire_cannot_materialize() {
        let mut recorder = Recorder::default();
        assert_eq!(wire().materialize(&mut recorder), Err(RouteError::NotReady));
        assert!(recorder.created.is_empty());
        assert!(recorder.deleted.is_empty());
    }

    #[test]
    fn failed_commit_removes_partial_wires() {
        let board = Board::new(6, 6, (0.0, 0.0), (4.0, 3.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        assert_eq!(w.segments().unwrap().len(), 2);

        let mut recorder = Recorder {
            capacity: Some(1),
            ..Recorder::default()
        };
        assert_eq!(
            w.materialize(&mut recorder),
            Err(RouteError::Commit("#7: factory full".to_string()))
        );
        assert_eq!(recorder.created.len(), 1);
        assert_eq!(recorder.deleted, vec![ComponentId(101)]);
    }

    #[test]
    fn negative_endpoint_stays_off_the_field_and_falls_back() {
        let board = Board::new(6, 4, (-3.0, 1.0), (5.0, 1.0));
        let mut w = wire();
        w.refresh(&board).unwrap();
        let route = w.route().unwrap();
        assert!(route.is_fallback);
        assert_eq!(route.waypoints, vec![c(-3, 1), c(5, 1)]);
        assert_eq!(w.segments().unwrap()[0].p1, Point::new(-3.0, 1.0));
    }
}
