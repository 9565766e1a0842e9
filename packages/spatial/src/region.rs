use geo::{BoundingRect, Coord, Intersects, MultiPolygon, Polygon, Rect};
use rstar::{AABB, Envelope};

/// A planar area that can be used as a [`crate::SpatialIndex`] query.
///
/// The envelope drives the R-tree broad-phase; [`Region::contains_point`]
/// is the exact narrow-phase test and decides membership on its own.
pub trait Region {
    /// Bounding box of the region, or `None` if the region is empty.
    fn envelope(&self) -> Option<AABB<[f64; 2]>>;

    /// Returns `true` if `point` lies inside or on the boundary.
    fn contains_point(&self, point: [f64; 2]) -> bool;
}

fn rect_to_aabb(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

const fn to_coord(point: [f64; 2]) -> Coord<f64> {
    Coord {
        x: point[0],
        y: point[1],
    }
}

impl Region for AABB<[f64; 2]> {
    fn envelope(&self) -> Option<AABB<[f64; 2]>> {
        Some(*self)
    }

    fn contains_point(&self, point: [f64; 2]) -> bool {
        Envelope::contains_point(self, &point)
    }
}

impl Region for Rect<f64> {
    fn envelope(&self) -> Option<AABB<[f64; 2]>> {
        Some(rect_to_aabb(*self))
    }

    fn contains_point(&self, point: [f64; 2]) -> bool {
        self.intersects(&to_coord(point))
    }
}

impl Region for Polygon<f64> {
    fn envelope(&self) -> Option<AABB<[f64; 2]>> {
        self.bounding_rect().map(rect_to_aabb)
    }

    fn contains_point(&self, point: [f64; 2]) -> bool {
        self.intersects(&to_coord(point))
    }
}

impl Region for MultiPolygon<f64> {
    fn envelope(&self) -> Option<AABB<[f64; 2]>> {
        self.bounding_rect().map(rect_to_aabb)
    }

    fn contains_point(&self, point: [f64; 2]) -> bool {
        self.intersects(&to_coord(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn empty_polygon_has_no_envelope() {
        let empty = Polygon::<f64>::new(geo::LineString::new(Vec::new()), Vec::new());
        assert!(Region::envelope(&empty).is_none());
    }

    #[test]
    fn polygon_with_hole_excludes_hole() {
        let donut = polygon![
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
            ],
            interiors: [
                [
                    (x: 4.0, y: 4.0),
                    (x: 6.0, y: 4.0),
                    (x: 6.0, y: 6.0),
                    (x: 4.0, y: 4.0),
                ],
            ],
        ];
        assert!(donut.contains_point([1.0, 1.0]));
        assert!(!donut.contains_point([5.5, 5.0]));
        assert!(donut.contains_point([10.0, 5.0]));
    }

    #[test]
    fn aabb_region_is_inclusive() {
        let aabb = AABB::from_corners([0.0, 0.0], [1.0, 1.0]);
        assert!(Region::contains_point(&aabb, [1.0, 1.0]));
        assert!(!Region::contains_point(&aabb, [1.0, 1.0001]));
    }
}
