use super::point::Point;
use super::rect::Rect;
use rstar::{AABB, RTree};

/// Bounding-box index over placed entities, keyed by an opaque id.
pub struct SpatialIndex<Id> {
    tree: RTree<IndexedRect<Id>>,
}

struct IndexedRect<Id> {
    rect: Rect,
    id: Id,
}

impl<Id> rstar::RTreeObject for IndexedRect<Id> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.rect.min.x, self.rect.min.y],
            [self.rect.max.x, self.rect.max.y],
        )
    }
}

impl<Id: Copy> SpatialIndex<Id> {
    pub fn bulk_load(items: Vec<(Rect, Id)>) -> Self {
        let items = items
            .into_iter()
            .map(|(rect, id)| IndexedRect { rect, id })
            .collect();
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    pub fn query(&self, rect: Rect) -> Vec<Id> {
        let aabb = AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&aabb)
            .map(|item| item.id)
            .collect()
    }

    pub fn query_point(&self, p: Point<f64>) -> Vec<Id> {
        self.query(Rect::new(p, p))
    }
}
