//! Buffered route corridor.

use geo::{BoundingRect, Distance, Euclidean, LineString, Point};
use rstar::AABB;
use saferoute_spatial::Region;

/// The set of planar points within `buffer_meters` of a polyline.
///
/// This is the Minkowski sum of the polyline with a disk, including round
/// joins at interior vertices and round caps at both ends. Membership is
/// decided by exact point-to-polyline distance rather than a polygonal
/// approximation of the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Corridor<'a> {
    line: &'a LineString<f64>,
    buffer_meters: f64,
}

impl<'a> Corridor<'a> {
    /// Corridor of half-width `buffer_meters` around `line`.
    #[must_use]
    pub const fn new(line: &'a LineString<f64>, buffer_meters: f64) -> Self {
        Self {
            line,
            buffer_meters,
        }
    }

    /// Half-width in metres.
    #[must_use]
    pub const fn buffer_meters(&self) -> f64 {
        self.buffer_meters
    }

    /// Shortest planar distance from `point` to the centre line.
    #[must_use]
    pub fn distance_to(&self, point: [f64; 2]) -> f64 {
        Euclidean.distance(&Point::new(point[0], point[1]), self.line)
    }
}

impl Region for Corridor<'_> {
    fn envelope(&self) -> Option<AABB<[f64; 2]>> {
        let rect = self.line.bounding_rect()?;
        let b = self.buffer_meters;
        Some(AABB::from_corners(
            [rect.min().x - b, rect.min().y - b],
            [rect.max().x + b, rect.max().y + b],
        ))
    }

    fn contains_point(&self, point: [f64; 2]) -> bool {
        self.distance_to(point) <= self.buffer_meters
    }
}
