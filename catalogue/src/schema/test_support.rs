//! Fixture builders shared by the test suites of this crate and the engine.

use super::{
    DatasetDimension, DatasetType, DimensionProperties, MeasurementType, ObservationRecord,
    ResamplingMethod, StorageType, StorageTypeDimension,
};
use crate::descriptor::SourceDatasetDescriptor;
use geocube_datatypes::dataset::{DatasetId, ObservationId};
use geocube_datatypes::indexing::DimensionIndexer;
use geocube_datatypes::primitives::TimeInstance;
use geocube_datatypes::raster::RasterDataType;
use geocube_datatypes::spatial_reference::SpatialReference;
use geocube_datatypes::util::Identifier;

/// One Julian year in seconds
pub const SECONDS_PER_YEAR: f64 = 31_557_600.;

/// A Landsat-5 TM storage type: one-degree tiles, 4000 pixels per degree,
/// yearly time buckets, six bands
pub fn ls5tm_storage_type() -> StorageType {
    let spatial = |name: &str, properties: DimensionProperties| StorageTypeDimension {
        dimension: name.to_string(),
        domain: "spatialXY".to_string(),
        order: if name == "longitude" { 2 } else { 1 },
        indexer: DimensionIndexer::regular(0., 1.).expect("positive extent"),
        elements: 4000,
        chunk_size: 500,
        reference_system: "EPSG:4326".to_string(),
        index_reference_system: "wholeDegrees".to_string(),
        index_origin: 0,
        properties,
    };

    let bands = ["B10", "B20", "B30", "B40", "B50", "B70"];

    StorageType {
        tag: "LS5TM".into(),
        name: "Landsat 5 TM, one-degree tiles".to_string(),
        driver: "chunkedArray".to_string(),
        spatial_reference: SpatialReference::epsg_4326(),
        dimensions: vec![
            StorageTypeDimension {
                dimension: "time".to_string(),
                domain: "temporal".to_string(),
                order: 0,
                indexer: DimensionIndexer::regular(0., SECONDS_PER_YEAR)
                    .expect("positive extent"),
                elements: 1,
                chunk_size: 1,
                reference_system: "secondsSinceEpoch".to_string(),
                index_reference_system: "calendarYear".to_string(),
                index_origin: 1970,
                properties: DimensionProperties::time(),
            },
            spatial("latitude", DimensionProperties::latitude()),
            spatial("longitude", DimensionProperties::longitude()),
        ],
        measurements: bands
            .iter()
            .enumerate()
            .map(|(i, band)| MeasurementType {
                tag: (*band).into(),
                name: format!("surface reflectance band {}", &band[1..2]),
                data_type: RasterDataType::I16,
                no_data_value: -999.,
                resampling_method: ResamplingMethod::Nearest,
                src_varname: Some(format!("band{}", i + 1)),
                compression: None,
                measurement_type_index: i as u16 + 1,
            })
            .collect(),
        global_attributes: [(
            "title".to_string(),
            "Landsat 5 TM surface reflectance".to_string(),
        )]
        .into_iter()
        .collect(),
    }
}

/// A descriptor for one scene with the given extents, as the prepare step
/// would emit it
pub fn scene_descriptor(
    lon: (f64, f64),
    lat: (f64, f64),
    start: TimeInstance,
    end: TimeInstance,
) -> SourceDatasetDescriptor {
    let seconds = |t: TimeInstance| t.inner() as f64 / 1000.;

    SourceDatasetDescriptor {
        id: DatasetId::new(),
        dataset_type: "NBAR".into(),
        observation_id: ObservationId::new(),
        observation_type: "acquisition".to_string(),
        start_datetime: start,
        end_datetime: end,
        instrument: "TM".to_string(),
        platform: "LANDSAT_5".to_string(),
        location: format!("file:///scenes/{}", uuid::Uuid::new_v4()),
        band_locations: [
            ("B10".to_string(), "scene01_B10.tif".to_string()),
            ("B20".to_string(), "scene01_B20.tif".to_string()),
        ]
        .into_iter()
        .collect(),
        dimensions: vec![
            DatasetDimension {
                dimension: "longitude".to_string(),
                min_value: lon.0,
                max_value: lon.1,
                indexing_value: None,
            },
            DatasetDimension {
                dimension: "latitude".to_string(),
                min_value: lat.0,
                max_value: lat.1,
                indexing_value: None,
            },
            DatasetDimension {
                dimension: "time".to_string(),
                min_value: seconds(start),
                max_value: seconds(end),
                indexing_value: Some(seconds(start)),
            },
        ],
        metadata: serde_json::Value::Null,
    }
}

/// The NBAR dataset type matching the LS5TM storage type's bands
pub fn nbar_dataset_type() -> DatasetType {
    DatasetType {
        tag: "NBAR".into(),
        name: "NBAR surface reflectance".to_string(),
        measurements: ls5tm_storage_type().measurements,
        domains: vec!["spatialXY".to_string(), "temporal".to_string()],
    }
}

/// The observation record belonging to a descriptor
pub fn observation_of(descriptor: &SourceDatasetDescriptor) -> ObservationRecord {
    ObservationRecord {
        id: descriptor.observation_id,
        observation_type: descriptor.observation_type.clone(),
        start_datetime: descriptor.start_datetime,
        end_datetime: descriptor.end_datetime,
        instrument: descriptor.instrument.clone(),
        platform: descriptor.platform.clone(),
    }
}
