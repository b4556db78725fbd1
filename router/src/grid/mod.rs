pub mod occupancy;

pub use occupancy::OccupancyGrid;

use schem_common::db::core::PlacedComponent;
use schem_common::db::indices::ComponentId;
use schem_common::geom::coord::GridCell;

/// Something placed on the canvas that routes must avoid.
pub trait Obstacle {
    fn id(&self) -> ComponentId;
    fn is_within_bbox(&self, x: f64, y: f64) -> bool;
}

impl<T: Obstacle + ?Sized> Obstacle for &T {
    fn id(&self) -> ComponentId {
        (**self).id()
    }
    fn is_within_bbox(&self, x: f64, y: f64) -> bool {
        (**self).is_within_bbox(x, y)
    }
}

impl Obstacle for PlacedComponent<'_> {
    fn id(&self) -> ComponentId {
        self.id
    }
    fn is_within_bbox(&self, x: f64, y: f64) -> bool {
        PlacedComponent::is_within_bbox(self, x, y)
    }
}

pub trait RoutingGrid {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// In bounds and unoccupied. Anything off the field is never free.
    fn is_free(&self, x: i64, y: i64) -> bool;

    fn contains(&self, cell: GridCell) -> bool {
        u32::try_from(cell.x).is_ok_and(|x| x < self.width())
            && u32::try_from(cell.y).is_ok_and(|y| y < self.height())
    }
}
