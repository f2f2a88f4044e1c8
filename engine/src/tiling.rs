//! The tile grid calculator: maps a source dataset's dimensional extent to
//! the finite set of cube-aligned tiles it intersects, and prepares the
//! pixel-space placement of each tile.
//!
//! Boundary rules: a coordinate exactly on a tile boundary belongs to the
//! tile whose minimum it equals, and a dataset that only grazes an adjacent
//! tile produces no task for that tile. Both fall out of the dimension
//! indexers.

use crate::error;
use crate::Result;
use geocube_catalogue::schema::{DatasetRecord, StorageType, TileIndex};
use geocube_datatypes::primitives::{BoundingBox2D, TimeInterval};
use geocube_datatypes::raster::TileInformation;

/// One tile a dataset or region intersects, with its placement and time
/// bucket
#[derive(Debug, Clone, PartialEq)]
pub struct TileTaskSpec {
    pub tile_index: TileIndex,
    pub tile_information: TileInformation,
    pub time: TimeInterval,
}

/// Computes tile index sets against one storage type
#[derive(Debug, Clone)]
pub struct TileGridCalculator {
    storage_type: StorageType,
}

impl TileGridCalculator {
    pub fn new(storage_type: StorageType) -> Self {
        Self { storage_type }
    }

    pub fn storage_type(&self) -> &StorageType {
        &self.storage_type
    }

    /// The tiles a catalogued dataset intersects
    pub fn tiles_for_dataset(&self, dataset: &DatasetRecord) -> Result<Vec<TileTaskSpec>> {
        let extent = |dimension: &str| -> Result<(f64, f64)> {
            dataset
                .dimension(dimension)
                .map(|d| (d.min_value, d.max_value))
                .ok_or_else(|| error::Error::DatasetMissingDimension {
                    dataset: dataset.id,
                    dimension: dimension.to_string(),
                })
        };

        let x_dimension = self.storage_type.x_dimension()?;
        let y_dimension = self.storage_type.y_dimension()?;
        let t_dimension = self.storage_type.time_dimension()?;

        let (x_min, x_max) = extent(&x_dimension.dimension)?;
        let (y_min, y_max) = extent(&y_dimension.dimension)?;
        let (t_min, t_max) = extent(&t_dimension.dimension)?;

        self.cross_product(
            t_dimension.tile_indices_intersecting(t_min, t_max)?,
            y_dimension.tile_indices_intersecting(y_min, y_max)?,
            x_dimension.tile_indices_intersecting(x_min, x_max)?,
        )
    }

    /// The tiles covered by a spatial region and time span, both in the
    /// storage type's native reference systems
    pub fn tiles_for_region(
        &self,
        bounds: BoundingBox2D,
        time: TimeInterval,
    ) -> Result<Vec<TileTaskSpec>> {
        let x_dimension = self.storage_type.x_dimension()?;
        let y_dimension = self.storage_type.y_dimension()?;
        let t_dimension = self.storage_type.time_dimension()?;

        let t_min = time.start().inner() as f64 / 1000.;
        let t_max = time.end().inner() as f64 / 1000.;

        self.cross_product(
            t_dimension.tile_indices_intersecting(t_min, t_max)?,
            y_dimension
                .tile_indices_intersecting(bounds.lower_left().y, bounds.upper_right().y)?,
            x_dimension
                .tile_indices_intersecting(bounds.lower_left().x, bounds.upper_right().x)?,
        )
    }

    fn cross_product(
        &self,
        t_indices: Vec<i64>,
        y_indices: Vec<i64>,
        x_indices: Vec<i64>,
    ) -> Result<Vec<TileTaskSpec>> {
        let mut tiles =
            Vec::with_capacity(t_indices.len() * y_indices.len() * x_indices.len());
        for &t in &t_indices {
            for &y in &y_indices {
                for &x in &x_indices {
                    let tile_index = TileIndex { t, y, x };
                    tiles.push(TileTaskSpec {
                        tile_index,
                        tile_information: self.storage_type.tile_information(&tile_index)?,
                        time: self.storage_type.tile_time_bounds(t)?,
                    });
                }
            }
        }
        Ok(tiles)
    }
}
