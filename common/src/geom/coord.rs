use super::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit cell of the routing field. Cells left of or above the origin are
/// representable so that endpoints off the field keep their position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncates a canvas position toward zero. Positions that are not finite
    /// or do not fit an `i32` have no cell.
    pub fn from_point(p: Point<f64>) -> Option<Self> {
        let axis = |v: f64| {
            let t = v.trunc();
            (t.is_finite() && t >= i32::MIN as f64 && t <= i32::MAX as f64).then_some(t as i32)
        };
        Some(Self::new(axis(p.x)?, axis(p.y)?))
    }

    /// Whether a single straight run joins the two cells.
    #[inline(always)]
    pub fn is_aligned_with(&self, other: GridCell) -> bool {
        self.x == other.x || self.y == other.y
    }

    #[inline(always)]
    pub fn manhattan(&self, other: GridCell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn to_point(self) -> Point<f64> {
        Point::new(self.x as f64, self.y as f64)
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
