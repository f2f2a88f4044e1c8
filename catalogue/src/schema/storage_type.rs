use super::{DimensionProperties, MeasurementType, TileIndex};
use crate::error;
use crate::util::UserInput;
use crate::Result;
use geocube_datatypes::dataset::StorageTypeTag;
use geocube_datatypes::indexing::{DimensionIndexer, IndexingType};
use geocube_datatypes::primitives::{BoundingBox2D, TimeInstance, TimeInterval};
use geocube_datatypes::raster::{GeoTransform, TileInformation};
use geocube_datatypes::spatial_reference::SpatialReference;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::collections::BTreeMap;
use std::collections::HashSet;

/// One dimension of a storage type's cube layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageTypeDimension {
    /// Name of a catalogued `Dimension`
    pub dimension: String,
    /// Tag of a catalogued `Domain` the dimension belongs to
    pub domain: String,
    /// Position in the tile's dimension order
    pub order: u8,
    /// Indexing rule; carries origin and extent for regular dimensions
    pub indexer: DimensionIndexer,
    /// Number of cells per tile along this dimension
    pub elements: usize,
    /// Chunk size used by the chunked-array backend
    pub chunk_size: usize,
    /// Native reference system tag
    pub reference_system: String,
    /// Reference system used for tile-index arithmetic
    pub index_reference_system: String,
    /// Offset between raw indices and indices in the index reference system
    #[serde(default)]
    pub index_origin: i64,
    /// CF attributes for the tile's coordinate variable
    #[serde(default)]
    pub properties: DimensionProperties,
}

impl StorageTypeDimension {
    pub fn indexing_type(&self) -> IndexingType {
        self.indexer.indexing_type()
    }

    /// The tile index covering `value`, expressed in the index reference
    /// system
    pub fn tile_index_of(&self, value: f64) -> Result<i64> {
        Ok(self.indexer.coord_to_index(value)? + self.index_origin)
    }

    /// Native value range of a tile index expressed in the index reference
    /// system
    pub fn tile_range(&self, tile_index: i64) -> Result<(f64, f64)> {
        Ok(self.indexer.index_to_range(tile_index - self.index_origin)?)
    }

    /// All tile indices intersected by `[min, max]`, in index reference
    /// system units
    pub fn tile_indices_intersecting(&self, min: f64, max: f64) -> Result<Vec<i64>> {
        Ok(self
            .indexer
            .indices_intersecting(min, max)?
            .into_iter()
            .map(|i| i + self.index_origin)
            .collect())
    }

    /// Cell size in native units, for regular dimensions
    pub fn cell_size(&self) -> Option<f64> {
        match &self.indexer {
            DimensionIndexer::Regular { extent, .. } => Some(extent / self.elements as f64),
            _ => None,
        }
    }
}

/// The cube layout of a family of tiles: grid size, CRS, dimensions and
/// measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageType {
    pub tag: StorageTypeTag,
    pub name: String,
    pub driver: String,
    pub spatial_reference: SpatialReference,
    /// Ordered by `order`
    pub dimensions: Vec<StorageTypeDimension>,
    /// Ordered by `measurement_type_index`
    pub measurements: Vec<MeasurementType>,
    /// CF metadata written into each tile
    #[serde(default)]
    pub global_attributes: BTreeMap<String, String>,
}

impl StorageType {
    pub fn dimension(&self, name: &str) -> Option<&StorageTypeDimension> {
        self.dimensions.iter().find(|d| d.dimension == name)
    }

    fn dimension_by_axis(&self, axis: &str) -> Result<&StorageTypeDimension> {
        self.dimensions
            .iter()
            .find(|d| d.properties.axis.as_deref() == Some(axis))
            .ok_or_else(|| error::Error::Schema {
                reason: format!(
                    "storage type `{}` declares no dimension with axis {axis}",
                    self.tag
                ),
            })
    }

    pub fn x_dimension(&self) -> Result<&StorageTypeDimension> {
        self.dimension_by_axis("X")
    }

    pub fn y_dimension(&self) -> Result<&StorageTypeDimension> {
        self.dimension_by_axis("Y")
    }

    pub fn time_dimension(&self) -> Result<&StorageTypeDimension> {
        self.dimension_by_axis("T")
    }

    pub fn measurement(&self, tag: &str) -> Option<&MeasurementType> {
        self.measurements.iter().find(|m| m.tag.0 == tag)
    }

    /// The spatial footprint of the tile at `(y_index, x_index)`
    pub fn tile_spatial_bounds(&self, y_index: i64, x_index: i64) -> Result<BoundingBox2D> {
        let x = self.x_dimension()?;
        let y = self.y_dimension()?;
        let (x_min, x_max) = x.tile_range(x_index)?;
        let (y_min, y_max) = y.tile_range(y_index)?;
        Ok(BoundingBox2D::new_unchecked(
            (x_min, y_min).into(),
            (x_max, y_max).into(),
        ))
    }

    /// The time span of the tile at `t_index`, assuming a
    /// seconds-since-epoch native axis
    pub fn tile_time_bounds(&self, t_index: i64) -> Result<TimeInterval> {
        let t = self.time_dimension()?;
        let (min, max) = t.tile_range(t_index)?;
        Ok(TimeInterval::new_unchecked(
            TimeInstance::from_millis_unchecked((min * 1000.) as i64),
            TimeInstance::from_millis_unchecked((max * 1000.) as i64),
        ))
    }

    /// Pixel-grid placement of the tile at `tile_index`
    pub fn tile_information(&self, tile_index: &TileIndex) -> Result<TileInformation> {
        let x = self.x_dimension()?;
        let y = self.y_dimension()?;
        let bounds = self.tile_spatial_bounds(tile_index.y, tile_index.x)?;

        let geo_transform = GeoTransform::new(
            bounds.upper_left(),
            bounds.size_x() / x.elements as f64,
            -(bounds.size_y() / y.elements as f64),
        );

        Ok(TileInformation::new(
            [tile_index.y, tile_index.x],
            [y.elements, x.elements].into(),
            geo_transform,
            self.spatial_reference,
        ))
    }
}

impl UserInput for StorageType {
    /// Checks the declaration-internal invariants; the store additionally
    /// validates references into the dimension and domain registries
    fn validate(&self) -> Result<()> {
        ensure!(
            !self.tag.0.is_empty() && !self.name.is_empty(),
            error::Schema {
                reason: "storage type tag and name must not be empty".to_string()
            }
        );

        let mut seen_dimensions = HashSet::new();
        for dimension in &self.dimensions {
            ensure!(
                seen_dimensions.insert(&dimension.dimension),
                error::Schema {
                    reason: format!(
                        "dimension `{}` appears more than once",
                        dimension.dimension
                    )
                }
            );
            ensure!(
                dimension.elements > 0,
                error::Schema {
                    reason: format!(
                        "dimension `{}` must have at least one element per tile",
                        dimension.dimension
                    )
                }
            );
            ensure!(
                dimension.chunk_size > 0 && dimension.chunk_size <= dimension.elements,
                error::Schema {
                    reason: format!(
                        "dimension `{}` chunk size must be in 1..={}",
                        dimension.dimension, dimension.elements
                    )
                }
            );
        }

        let mut seen_orders = HashSet::new();
        ensure!(
            self.dimensions.iter().all(|d| seen_orders.insert(d.order)),
            error::Schema {
                reason: "dimension orders must be unique".to_string()
            }
        );

        ensure!(
            !self.measurements.is_empty(),
            error::Schema {
                reason: "a storage type needs at least one measurement".to_string()
            }
        );

        let mut seen_indices = HashSet::new();
        let mut seen_tags = HashSet::new();
        for measurement in &self.measurements {
            ensure!(
                measurement.measurement_type_index >= 1
                    && measurement.measurement_type_index as usize <= self.measurements.len()
                    && seen_indices.insert(measurement.measurement_type_index),
                error::Schema {
                    reason: format!(
                        "measurement `{}` has a duplicate or out-of-range index {}",
                        measurement.tag, measurement.measurement_type_index
                    )
                }
            );
            ensure!(
                seen_tags.insert(&measurement.tag),
                error::Schema {
                    reason: format!("measurement tag `{}` appears more than once", measurement.tag)
                }
            );
            ensure!(
                measurement
                    .data_type
                    .can_represent(measurement.no_data_value),
                error::Schema {
                    reason: format!(
                        "no-data value {} of measurement `{}` is not representable as {}",
                        measurement.no_data_value, measurement.tag, measurement.data_type
                    )
                }
            );
        }

        // fixed spectral enumerations must point at declared measurements
        for dimension in &self.dimensions {
            if dimension.domain != "spectral" {
                continue;
            }
            if let DimensionIndexer::Fixed { entries } = &dimension.indexer {
                for entry in entries {
                    ensure!(
                        self.measurement(&entry.tag).is_some(),
                        error::Schema {
                            reason: format!(
                                "fixed index entry `{}` of dimension `{}` names no measurement",
                                entry.tag, dimension.dimension
                            )
                        }
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_support::ls5tm_storage_type;

    #[test]
    fn validates_a_well_formed_declaration() {
        assert!(ls5tm_storage_type().validate().is_ok());
    }

    #[test]
    fn rejects_duplicate_dimensions() {
        let mut storage_type = ls5tm_storage_type();
        let duplicate = storage_type.dimensions[0].clone();
        storage_type.dimensions.push(duplicate);
        assert!(matches!(
            storage_type.validate().unwrap_err(),
            error::Error::Schema { .. }
        ));
    }

    #[test]
    fn rejects_duplicate_measurement_indices() {
        let mut storage_type = ls5tm_storage_type();
        storage_type.measurements[1].measurement_type_index =
            storage_type.measurements[0].measurement_type_index;
        assert!(storage_type.validate().is_err());
    }

    #[test]
    fn rejects_unrepresentable_no_data() {
        let mut storage_type = ls5tm_storage_type();
        storage_type.measurements[0].no_data_value = 1e12;
        assert!(storage_type.validate().is_err());
    }

    #[test]
    fn tile_arithmetic_matches_the_declaration() {
        let storage_type = ls5tm_storage_type();

        let x = storage_type.x_dimension().unwrap();
        assert_eq!(x.tile_index_of(140.2).unwrap(), 140);
        assert_eq!(x.tile_range(140).unwrap(), (140., 141.));

        let t = storage_type.time_dimension().unwrap();
        // 2010-06-15 in seconds since the epoch
        let seconds = 1_276_560_000.;
        assert_eq!(t.tile_index_of(seconds).unwrap(), 2010);

        let bounds = storage_type.tile_spatial_bounds(-36, 140).unwrap();
        assert_eq!(
            bounds,
            BoundingBox2D::new_unchecked((140., -36.).into(), (141., -35.).into())
        );

        let info = storage_type
            .tile_information(&TileIndex {
                t: 2010,
                y: -36,
                x: 140,
            })
            .unwrap();
        assert_eq!(info.tile_size_in_pixels.axis_size_x(), 4000);
        float_cmp::assert_approx_eq!(f64, info.geo_transform.x_pixel_size, 1. / 4000.);
    }

    #[test]
    fn tile_time_bounds_land_on_calendar_years() {
        let storage_type = ls5tm_storage_type();
        let time_bounds = storage_type.tile_time_bounds(2010).unwrap();
        assert_eq!(
            time_bounds.start().as_rfc3339(),
            "2010-01-01T00:00:00+00:00"
        );
    }
}
