mod data_type;
mod geo_transform;
mod grid;
mod raster_tile;
mod tiling;

pub use data_type::{FromPrimitive, Pixel, RasterDataType, TypedRasterValue};
pub use geo_transform::GeoTransform;
pub use grid::{Grid2D, GridShape2D};
pub use raster_tile::{RasterTile2D, TileInformation};
pub use tiling::TilingSpecification;
