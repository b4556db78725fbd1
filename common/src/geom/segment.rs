use super::point::Point;

/// A straight piece of a rendered wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub p1: Point<f64>,
    pub p2: Point<f64>,
}

impl Segment {
    pub fn new(p1: Point<f64>, p2: Point<f64>) -> Self {
        Self { p1, p2 }
    }

    /// Perpendicular distance from `p` to the infinite line through the
    /// segment. A zero-length segment measures the distance to its point.
    pub fn line_distance(&self, p: Point<f64>) -> f64 {
        let dir = self.p2 - self.p1;
        let len = dir.norm();
        if len <= f64::EPSILON {
            return self.p1.distance(p);
        }
        dir.cross(self.p1 - p).abs() / len
    }
}
