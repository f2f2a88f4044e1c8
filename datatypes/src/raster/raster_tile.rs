use crate::primitives::{BoundingBox2D, SpatialBounded, TemporalBounded, TimeInterval};
use crate::raster::{GeoTransform, Grid2D, GridShape2D, Pixel};
use crate::spatial_reference::SpatialReference;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

/// The spatial position of a tile within its cube grid
#[derive(PartialEq, Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileInformation {
    /// Tile index as `[y, x]` in cube tile units
    pub global_tile_position: [i64; 2],
    pub tile_size_in_pixels: GridShape2D,
    pub geo_transform: GeoTransform,
    pub spatial_reference: SpatialReference,
}

impl TileInformation {
    pub fn new(
        global_tile_position: [i64; 2],
        tile_size_in_pixels: GridShape2D,
        geo_transform: GeoTransform,
        spatial_reference: SpatialReference,
    ) -> Self {
        Self {
            global_tile_position,
            tile_size_in_pixels,
            geo_transform,
            spatial_reference,
        }
    }

    pub fn tile_index_y(&self) -> i64 {
        self.global_tile_position[0]
    }

    pub fn tile_index_x(&self) -> i64 {
        self.global_tile_position[1]
    }
}

impl SpatialBounded for TileInformation {
    fn spatial_bounds(&self) -> BoundingBox2D {
        self.geo_transform.grid_bounds(self.tile_size_in_pixels)
    }
}

/// A `RasterTile2D` is the main type used to iterate over tiles of 2D raster
/// data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    rename_all = "camelCase",
    bound(serialize = "T: Serialize", deserialize = "T: serde::de::DeserializeOwned")
)]
pub struct RasterTile2D<T>
where
    T: Pixel,
{
    pub time: TimeInterval,
    pub tile: TileInformation,
    pub grid_array: Grid2D<T>,
}

impl<T> RasterTile2D<T>
where
    T: Pixel,
{
    pub fn new(time: TimeInterval, tile: TileInformation, grid_array: Grid2D<T>) -> Self {
        Self {
            time,
            tile,
            grid_array,
        }
    }

    /// Converts the data type of the raster tile by converting its inner grid
    pub fn convert<To>(self) -> RasterTile2D<To>
    where
        To: Pixel,
        T: AsPrimitive<To>,
    {
        RasterTile2D::new(self.time, self.tile, self.grid_array.convert())
    }
}

impl<T> TemporalBounded for RasterTile2D<T>
where
    T: Pixel,
{
    fn temporal_bounds(&self) -> TimeInterval {
        self.time
    }
}

impl<T> SpatialBounded for RasterTile2D<T>
where
    T: Pixel,
{
    fn spatial_bounds(&self) -> BoundingBox2D {
        self.tile.spatial_bounds()
    }
}
