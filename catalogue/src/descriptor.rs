//! Documents crossing the catalogue boundary: the source-dataset descriptor
//! emitted by the external prepare step and the storage-type definition.

use crate::error;
use crate::schema::{
    DatasetDimension, DimensionProperties, MeasurementType, ResamplingMethod, StorageType,
    StorageTypeDimension,
};
use crate::util::UserInput;
use crate::Result;
use geocube_datatypes::dataset::{DatasetId, DatasetTypeTag, ObservationId};
use geocube_datatypes::indexing::DimensionIndexer;
use geocube_datatypes::primitives::TimeInstance;
use geocube_datatypes::raster::RasterDataType;
use geocube_datatypes::spatial_reference::SpatialReference;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::collections::BTreeMap;

/// Uniform description of one source scene file, as emitted by the prepare
/// step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDatasetDescriptor {
    pub id: DatasetId,
    pub dataset_type: DatasetTypeTag,
    pub observation_id: ObservationId,
    pub observation_type: String,
    pub start_datetime: TimeInstance,
    pub end_datetime: TimeInstance,
    pub instrument: String,
    pub platform: String,
    /// URI of the scene folder or file
    pub location: String,
    /// Per-band file locations, relative to `location`
    pub band_locations: BTreeMap<String, String>,
    pub dimensions: Vec<DatasetDimension>,
    /// Free-form metadata blob (XML or equivalent), preserved verbatim
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl UserInput for SourceDatasetDescriptor {
    fn validate(&self) -> Result<()> {
        ensure!(
            !self.location.is_empty(),
            error::Schema {
                reason: "a dataset descriptor needs a location".to_string()
            }
        );
        ensure!(
            self.start_datetime <= self.end_datetime,
            error::Schema {
                reason: format!(
                    "descriptor start {} is after its end {}",
                    self.start_datetime, self.end_datetime
                )
            }
        );
        for dimension in &self.dimensions {
            ensure!(
                dimension.min_value <= dimension.max_value,
                error::Schema {
                    reason: format!(
                        "descriptor dimension `{}` has min {} > max {}",
                        dimension.dimension, dimension.min_value, dimension.max_value
                    )
                }
            );
        }
        Ok(())
    }
}

/// The `storage` block of a storage-type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageBlock {
    pub driver: String,
    pub crs: SpatialReference,
    /// Tile extent in native units per dimension name
    pub tile_extent: BTreeMap<String, f64>,
    /// Pixels per tile per dimension name
    pub elements: BTreeMap<String, usize>,
    /// Chunk size per dimension name
    pub chunking: BTreeMap<String, usize>,
    /// Grid origin per dimension name
    #[serde(default)]
    pub origin: BTreeMap<String, f64>,
    #[serde(default)]
    pub resampling: ResamplingMethod,
}

/// One measurement of a storage-type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementDefinition {
    pub name: String,
    pub dtype: RasterDataType,
    pub nodata: f64,
    #[serde(default)]
    pub resampling_method: Option<ResamplingMethod>,
    #[serde(default)]
    pub src_varname: Option<String>,
    #[serde(default)]
    pub compression: Option<String>,
}

/// A storage-type definition document; lowers into a `StorageType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageTypeDefinition {
    pub name: String,
    pub tag: String,
    pub driver: String,
    pub storage: StorageBlock,
    /// Ordered; the position defines the `measurement_type_index`
    pub measurements: Vec<MeasurementDefinition>,
    #[serde(default)]
    pub global_attributes: BTreeMap<String, String>,
}

impl StorageTypeDefinition {
    /// Lowers the document into catalogue records. The definition describes
    /// a time/latitude/longitude cube; the document's dimension maps must
    /// agree on that set of names.
    pub fn into_storage_type(self) -> Result<StorageType> {
        let dimension = |name: &str,
                         domain: &str,
                         order: u8,
                         reference_system: &str,
                         index_reference_system: &str,
                         index_origin: i64,
                         properties: DimensionProperties|
         -> Result<StorageTypeDimension> {
            let extent = *self.storage.tile_extent.get(name).ok_or_else(|| {
                error::Error::Schema {
                    reason: format!("storage block misses the tile extent of `{name}`"),
                }
            })?;
            let elements =
                *self
                    .storage
                    .elements
                    .get(name)
                    .ok_or_else(|| error::Error::Schema {
                        reason: format!("storage block misses the element count of `{name}`"),
                    })?;
            let chunk_size = self.storage.chunking.get(name).copied().unwrap_or(elements);
            let origin = self.storage.origin.get(name).copied().unwrap_or(0.);

            Ok(StorageTypeDimension {
                dimension: name.to_string(),
                domain: domain.to_string(),
                order,
                indexer: DimensionIndexer::regular(origin, extent)?,
                elements,
                chunk_size,
                reference_system: reference_system.to_string(),
                index_reference_system: index_reference_system.to_string(),
                index_origin,
                properties,
            })
        };

        let storage_type = StorageType {
            tag: self.tag.clone().into(),
            name: self.name.clone(),
            driver: self.driver.clone(),
            spatial_reference: self.storage.crs,
            dimensions: vec![
                dimension(
                    "time",
                    "temporal",
                    0,
                    "secondsSinceEpoch",
                    "calendarYear",
                    1970,
                    DimensionProperties::time(),
                )?,
                dimension(
                    "latitude",
                    "spatialXY",
                    1,
                    "EPSG:4326",
                    "wholeDegrees",
                    0,
                    DimensionProperties::latitude(),
                )?,
                dimension(
                    "longitude",
                    "spatialXY",
                    2,
                    "EPSG:4326",
                    "wholeDegrees",
                    0,
                    DimensionProperties::longitude(),
                )?,
            ],
            measurements: self
                .measurements
                .into_iter()
                .enumerate()
                .map(|(i, m)| MeasurementType {
                    tag: m.name.clone().into(),
                    name: m.name,
                    data_type: m.dtype,
                    no_data_value: m.nodata,
                    resampling_method: m.resampling_method.unwrap_or(self.storage.resampling),
                    src_varname: m.src_varname,
                    compression: m.compression,
                    measurement_type_index: i as u16 + 1,
                })
                .collect(),
            global_attributes: self.global_attributes,
        };

        storage_type.validate()?;
        Ok(storage_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_support::SECONDS_PER_YEAR;

    fn definition_json() -> serde_json::Value {
        serde_json::json!({
            "name": "Landsat 5 TM, one-degree tiles",
            "tag": "LS5TM",
            "driver": "chunkedArray",
            "storage": {
                "driver": "chunkedArray",
                "crs": "EPSG:4326",
                "tileExtent": { "time": SECONDS_PER_YEAR, "latitude": 1.0, "longitude": 1.0 },
                "elements": { "time": 1, "latitude": 4000, "longitude": 4000 },
                "chunking": { "time": 1, "latitude": 500, "longitude": 500 },
                "resampling": "nearest"
            },
            "measurements": [
                { "name": "B10", "dtype": "I16", "nodata": -999.0 },
                { "name": "B20", "dtype": "I16", "nodata": -999.0, "resamplingMethod": "bilinear" }
            ],
            "globalAttributes": { "title": "Landsat 5 TM surface reflectance" }
        })
    }

    #[test]
    fn parses_and_lowers_a_definition_document() {
        let definition: StorageTypeDefinition =
            serde_json::from_value(definition_json()).unwrap();
        let storage_type = definition.into_storage_type().unwrap();

        assert_eq!(storage_type.tag.0, "LS5TM");
        assert_eq!(storage_type.dimensions.len(), 3);
        assert_eq!(storage_type.measurements.len(), 2);
        assert_eq!(storage_type.measurements[0].measurement_type_index, 1);
        assert_eq!(
            storage_type.measurements[0].resampling_method,
            ResamplingMethod::Nearest
        );
        assert_eq!(
            storage_type.measurements[1].resampling_method,
            ResamplingMethod::Bilinear
        );
        assert_eq!(
            storage_type.time_dimension().unwrap().index_origin,
            1970
        );
    }

    #[test]
    fn missing_dimension_entries_are_schema_errors() {
        let mut json = definition_json();
        json["storage"]["tileExtent"]
            .as_object_mut()
            .unwrap()
            .remove("latitude");
        let definition: StorageTypeDefinition = serde_json::from_value(json).unwrap();
        assert!(matches!(
            definition.into_storage_type().unwrap_err(),
            error::Error::Schema { .. }
        ));
    }

    #[test]
    fn descriptor_serde_round_trip() {
        let descriptor = crate::schema::test_support::scene_descriptor(
            (140.2, 141.1),
            (-35.9, -35.0),
            "2010-06-15".parse().unwrap(),
            "2010-06-15T00:01:40Z".parse().unwrap(),
        );

        let json = serde_json::to_string(&descriptor).unwrap();
        let back: SourceDatasetDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(descriptor, back);
        assert!(back.validate().is_ok());
    }

    #[test]
    fn descriptor_validation_rejects_reversed_ranges() {
        let mut descriptor = crate::schema::test_support::scene_descriptor(
            (141.1, 140.2),
            (-35.9, -35.0),
            "2010-06-15".parse().unwrap(),
            "2010-06-15T00:01:40Z".parse().unwrap(),
        );
        descriptor.dimensions[0].min_value = 141.1;
        descriptor.dimensions[0].max_value = 140.2;
        assert!(descriptor.validate().is_err());
    }
}
