use super::Coordinate2D;
use crate::error;
use crate::Result;
use serde::{Deserialize, Serialize};
use snafu::ensure;

/// An axis-aligned rectangle given by its lower left and upper right coordinates
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox2D {
    lower_left_coordinate: Coordinate2D,
    upper_right_coordinate: Coordinate2D,
}

impl BoundingBox2D {
    /// Creates a new bounding box, fails with `InvalidBoundingBox` if the
    /// coordinates are not ordered lower left / upper right
    pub fn new(
        lower_left_coordinate: Coordinate2D,
        upper_right_coordinate: Coordinate2D,
    ) -> Result<Self> {
        ensure!(
            lower_left_coordinate.x <= upper_right_coordinate.x
                && lower_left_coordinate.y <= upper_right_coordinate.y,
            error::InvalidBoundingBox {
                lower_left_coordinate,
                upper_right_coordinate
            }
        );
        Ok(Self {
            lower_left_coordinate,
            upper_right_coordinate,
        })
    }

    pub fn new_unchecked(
        lower_left_coordinate: Coordinate2D,
        upper_right_coordinate: Coordinate2D,
    ) -> Self {
        Self {
            lower_left_coordinate,
            upper_right_coordinate,
        }
    }

    pub fn new_upper_left_lower_right_unchecked(
        upper_left_coordinate: Coordinate2D,
        lower_right_coordinate: Coordinate2D,
    ) -> Self {
        Self {
            lower_left_coordinate: Coordinate2D::new(
                upper_left_coordinate.x,
                lower_right_coordinate.y,
            ),
            upper_right_coordinate: Coordinate2D::new(
                lower_right_coordinate.x,
                upper_left_coordinate.y,
            ),
        }
    }

    pub fn lower_left(&self) -> Coordinate2D {
        self.lower_left_coordinate
    }

    pub fn upper_right(&self) -> Coordinate2D {
        self.upper_right_coordinate
    }

    pub fn upper_left(&self) -> Coordinate2D {
        Coordinate2D::new(self.lower_left_coordinate.x, self.upper_right_coordinate.y)
    }

    pub fn lower_right(&self) -> Coordinate2D {
        Coordinate2D::new(self.upper_right_coordinate.x, self.lower_left_coordinate.y)
    }

    pub fn size_x(&self) -> f64 {
        self.upper_right_coordinate.x - self.lower_left_coordinate.x
    }

    pub fn size_y(&self) -> f64 {
        self.upper_right_coordinate.y - self.lower_left_coordinate.y
    }

    pub fn center(&self) -> Coordinate2D {
        (self.lower_left_coordinate + self.upper_right_coordinate) / 2.
    }

    pub fn contains_coordinate(&self, coordinate: &Coordinate2D) -> bool {
        coordinate.x >= self.lower_left_coordinate.x
            && coordinate.x <= self.upper_right_coordinate.x
            && coordinate.y >= self.lower_left_coordinate.y
            && coordinate.y <= self.upper_right_coordinate.y
    }

    pub fn contains_bbox(&self, other: &Self) -> bool {
        self.contains_coordinate(&other.lower_left_coordinate)
            && self.contains_coordinate(&other.upper_right_coordinate)
    }

    /// Whether the two boxes share any point, boundaries included
    pub fn intersects_bbox(&self, other: &Self) -> bool {
        self.lower_left_coordinate.x <= other.upper_right_coordinate.x
            && self.upper_right_coordinate.x >= other.lower_left_coordinate.x
            && self.lower_left_coordinate.y <= other.upper_right_coordinate.y
            && self.upper_right_coordinate.y >= other.lower_left_coordinate.y
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects_bbox(other) {
            return None;
        }
        Some(Self::new_unchecked(
            Coordinate2D::new(
                self.lower_left_coordinate.x.max(other.lower_left_coordinate.x),
                self.lower_left_coordinate.y.max(other.lower_left_coordinate.y),
            ),
            Coordinate2D::new(
                self.upper_right_coordinate
                    .x
                    .min(other.upper_right_coordinate.x),
                self.upper_right_coordinate
                    .y
                    .min(other.upper_right_coordinate.y),
            ),
        ))
    }

    pub fn extended(&self, other: &Self) -> Self {
        Self::new_unchecked(
            Coordinate2D::new(
                self.lower_left_coordinate.x.min(other.lower_left_coordinate.x),
                self.lower_left_coordinate.y.min(other.lower_left_coordinate.y),
            ),
            Coordinate2D::new(
                self.upper_right_coordinate
                    .x
                    .max(other.upper_right_coordinate.x),
                self.upper_right_coordinate
                    .y
                    .max(other.upper_right_coordinate.y),
            ),
        )
    }

    /// The envelope of a set of coordinates
    pub fn from_coord_iter<I: IntoIterator<Item = Coordinate2D>>(iter: I) -> Option<Self> {
        let mut iter = iter.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new_unchecked(first, first);
        for c in iter {
            bbox = Self::new_unchecked(
                Coordinate2D::new(bbox.lower_left_coordinate.x.min(c.x), bbox.lower_left_coordinate.y.min(c.y)),
                Coordinate2D::new(bbox.upper_right_coordinate.x.max(c.x), bbox.upper_right_coordinate.y.max(c.y)),
            );
        }
        Some(bbox)
    }

    /// The corner points plus intermediate points every `max_segment_length`
    /// along each edge, counter-clockwise starting at the lower left
    pub fn densified_boundary(&self, max_segment_length: f64) -> Vec<Coordinate2D> {
        let corners = [
            self.lower_left(),
            self.lower_right(),
            self.upper_right(),
            self.upper_left(),
        ];

        let mut points = Vec::new();
        for i in 0..4 {
            let from = corners[i];
            let to = corners[(i + 1) % 4];
            let segments = (from.euclidean_distance(&to) / max_segment_length)
                .ceil()
                .max(1.) as usize;
            for s in 0..segments {
                let f = s as f64 / segments as f64;
                points.push(from + (to - from) * f);
            }
        }
        points
    }
}

impl From<BoundingBox2D> for geo::Rect<f64> {
    fn from(bbox: BoundingBox2D) -> Self {
        geo::Rect::new(
            geo::Coordinate::from(bbox.lower_left()),
            geo::Coordinate::from(bbox.upper_right()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_flipped_corners() {
        assert!(BoundingBox2D::new((1., 1.).into(), (0., 0.).into()).is_err());
        assert!(BoundingBox2D::new((0., 0.).into(), (1., 1.).into()).is_ok());
    }

    #[test]
    fn intersection() {
        let a = BoundingBox2D::new_unchecked((0., 0.).into(), (2., 2.).into());
        let b = BoundingBox2D::new_unchecked((1., 1.).into(), (3., 3.).into());
        let c = a.intersection(&b).unwrap();
        assert_eq!(c, BoundingBox2D::new_unchecked((1., 1.).into(), (2., 2.).into()));

        let d = BoundingBox2D::new_unchecked((5., 5.).into(), (6., 6.).into());
        assert!(a.intersection(&d).is_none());
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = BoundingBox2D::new_unchecked((0., 0.).into(), (1., 1.).into());
        let b = BoundingBox2D::new_unchecked((1., 0.).into(), (2., 1.).into());
        assert!(a.intersects_bbox(&b));
    }

    #[test]
    fn densified_boundary_covers_all_edges() {
        let bbox = BoundingBox2D::new_unchecked((0., 0.).into(), (10., 10.).into());
        let boundary = bbox.densified_boundary(1.);
        assert_eq!(boundary.len(), 40);
        assert!(boundary.contains(&(0., 0.).into()));
        assert!(boundary.contains(&(10., 0.).into()));
        assert!(boundary.contains(&(10., 10.).into()));
        assert!(boundary.contains(&(0., 10.).into()));
    }
}
