use crate::primitives::Coordinate2D;
use crate::raster::GridShape2D;
use serde::{Deserialize, Serialize};

/// The global tiling grid: a world origin plus the pixel shape of each tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilingSpecification {
    pub origin_coordinate: Coordinate2D,
    pub tile_size_in_pixels: GridShape2D,
}

impl TilingSpecification {
    pub fn new(origin_coordinate: Coordinate2D, tile_size_in_pixels: GridShape2D) -> Self {
        Self {
            origin_coordinate,
            tile_size_in_pixels,
        }
    }
}

impl Default for TilingSpecification {
    fn default() -> Self {
        Self {
            origin_coordinate: Coordinate2D::default(),
            tile_size_in_pixels: [512, 512].into(),
        }
    }
}
