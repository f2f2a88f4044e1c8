use crate::primitives::{BoundingBox2D, Coordinate2D, SpatialResolution};
use serde::{Deserialize, Serialize};

/// Maps grid indices to coordinates. The origin is the upper left corner of
/// the upper left pixel; `y_pixel_size` is negative for north-up rasters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoTransform {
    pub origin_coordinate: Coordinate2D,
    pub x_pixel_size: f64,
    pub y_pixel_size: f64,
}

impl GeoTransform {
    pub fn new(origin_coordinate: Coordinate2D, x_pixel_size: f64, y_pixel_size: f64) -> Self {
        debug_assert!(x_pixel_size > 0.);
        debug_assert!(y_pixel_size < 0.);
        Self {
            origin_coordinate,
            x_pixel_size,
            y_pixel_size,
        }
    }

    /// The coordinate of the upper left corner of pixel `(y, x)`
    pub fn grid_2d_to_coordinate_2d(&self, (y, x): (f64, f64)) -> Coordinate2D {
        Coordinate2D::new(
            self.origin_coordinate.x + x * self.x_pixel_size,
            self.origin_coordinate.y + y * self.y_pixel_size,
        )
    }

    /// The coordinate of the centre of pixel `(y, x)`
    pub fn pixel_center_coordinate_2d(&self, (y, x): (usize, usize)) -> Coordinate2D {
        self.grid_2d_to_coordinate_2d((y as f64 + 0.5, x as f64 + 0.5))
    }

    /// The pixel that contains `coordinate`; a coordinate exactly on a pixel
    /// boundary belongs to the pixel whose upper left corner it is
    pub fn coordinate_2d_to_grid_2d(&self, coordinate: Coordinate2D) -> (isize, isize) {
        let x = ((coordinate.x - self.origin_coordinate.x) / self.x_pixel_size).floor() as isize;
        let y = ((coordinate.y - self.origin_coordinate.y) / self.y_pixel_size).floor() as isize;
        (y, x)
    }

    pub fn spatial_resolution(&self) -> SpatialResolution {
        SpatialResolution::new_unchecked(self.x_pixel_size, self.y_pixel_size.abs())
    }

    /// The bounds of a grid of `shape` pixels anchored at the origin
    pub fn grid_bounds(&self, shape: super::GridShape2D) -> BoundingBox2D {
        let lower_right = self.grid_2d_to_coordinate_2d((
            shape.axis_size_y() as f64,
            shape.axis_size_x() as f64,
        ));
        BoundingBox2D::new_upper_left_lower_right_unchecked(self.origin_coordinate, lower_right)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(Coordinate2D::default(), 1., -1.)
    }
}
