use super::{Obstacle, RoutingGrid};
use crate::error::RouteError;
use schem_common::db::indices::ComponentId;

/// Boolean obstacle map over `width x height` cells, row-major.
#[derive(Clone, Debug, Default)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    occupied: Vec<bool>,
}

impl OccupancyGrid {
    pub fn new(width: i64, height: i64) -> Result<Self, RouteError> {
        let mut grid = Self::default();
        grid.resize(width, height)?;
        Ok(grid)
    }

    #[inline(always)]
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    /// Reallocates to the new dimensions with every cell free.
    pub fn resize(&mut self, width: i64, height: i64) -> Result<(), RouteError> {
        let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(RouteError::InvalidDimension { width, height });
        };
        self.width = w;
        self.height = h;
        self.occupied.clear();
        self.occupied.resize((w as usize) * (h as usize), false);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.occupied.fill(false);
    }

    /// Out-of-bounds coordinates are ignored.
    pub fn mark_occupied(&mut self, x: i64, y: i64) {
        if let Some(idx) = self.index(x, y) {
            self.occupied[idx] = true;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }

    /// Resizes, clears, then marks every cell lying inside the bounding box of
    /// any obstacle other than `self_id`. Returns the number of occupied cells.
    pub fn rebuild<O: Obstacle>(
        &mut self,
        width: i64,
        height: i64,
        obstacles: impl IntoIterator<Item = O>,
        self_id: ComponentId,
    ) -> Result<usize, RouteError> {
        self.resize(width, height)?;
        let obstacles: Vec<O> = obstacles
            .into_iter()
            .filter(|o| o.id() != self_id)
            .collect();

        let mut count = 0;
        for y in 0..self.height as i64 {
            for x in 0..self.width as i64 {
                if obstacles
                    .iter()
                    .any(|o| o.is_within_bbox(x as f64, y as f64))
                {
                    self.mark_occupied(x, y);
                    count += 1;
                }
            }
        }
        log::trace!(
            "Rebuilt {}x{} grid from {} obstacles: {} cells occupied",
            self.width,
            self.height,
            obstacles.len(),
            count
        );
        Ok(count)
    }
}

impl RoutingGrid for OccupancyGrid {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }

    fn is_free(&self, x: i64, y: i64) -> bool {
        self.index(x, y).is_some_and(|idx| !self.occupied[idx])
    }
}
