//! The seam towards source scene files. The external prepare step catalogues
//! per-band locations; an implementation of `SourceBandReader` resolves them
//! into pixel grids. Vendor format decoding lives behind this trait and is
//! not part of the core.

use crate::error;
use crate::typed_grid::TypedGrid;
use crate::Result;
use async_trait::async_trait;
use geocube_catalogue::schema::{DatasetRecord, MeasurementType};
use geocube_datatypes::dataset::DatasetId;
use geocube_datatypes::raster::GeoTransform;
use geocube_datatypes::spatial_reference::SpatialReference;
use std::collections::HashMap;
use std::sync::RwLock;

/// One band of a source scene, with its placement
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBand {
    pub grid: TypedGrid,
    pub geo_transform: GeoTransform,
    pub spatial_reference: SpatialReference,
}

/// Opens bands of catalogued source datasets
#[async_trait]
pub trait SourceBandReader: Send + Sync {
    /// Reads the band backing `measurement`, preferring its `src_varname`
    /// over its tag to resolve the file
    async fn read_band(
        &self,
        dataset: &DatasetRecord,
        measurement: &MeasurementType,
    ) -> Result<SourceBand>;
}

/// A reader over grids registered in memory; the reference implementation
/// used by the test suites. Datasets can be marked broken to exercise the
/// `skip_broken_datasets` paths.
#[derive(Default)]
pub struct InMemorySourceReader {
    bands: RwLock<HashMap<(DatasetId, String), SourceBand>>,
    broken: RwLock<Vec<DatasetId>>,
}

impl InMemorySourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_band(&self, dataset: DatasetId, measurement_tag: &str, band: SourceBand) {
        self.bands
            .write()
            .expect("source reader lock poisoned")
            .insert((dataset, measurement_tag.to_string()), band);
    }

    /// Every subsequent read of this dataset fails with a read error
    pub fn mark_broken(&self, dataset: DatasetId) {
        self.broken
            .write()
            .expect("source reader lock poisoned")
            .push(dataset);
    }
}

#[async_trait]
impl SourceBandReader for InMemorySourceReader {
    async fn read_band(
        &self,
        dataset: &DatasetRecord,
        measurement: &MeasurementType,
    ) -> Result<SourceBand> {
        if self
            .broken
            .read()
            .expect("source reader lock poisoned")
            .contains(&dataset.id)
        {
            return Err(error::Error::Read {
                dataset: dataset.id,
                reason: "file is corrupt".to_string(),
            });
        }

        let bands = self.bands.read().expect("source reader lock poisoned");
        bands
            .get(&(dataset.id, measurement.tag.0.clone()))
            .cloned()
            .ok_or_else(|| error::Error::Read {
                dataset: dataset.id,
                reason: format!("band `{}` not found at `{}`", measurement.tag, dataset.location),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocube_catalogue::schema::test_support::{ls5tm_storage_type, scene_descriptor};
    use geocube_datatypes::raster::Grid2D;
    use geocube_datatypes::util::Identifier;

    fn a_dataset() -> DatasetRecord {
        let descriptor = scene_descriptor(
            (140., 141.),
            (-36., -35.),
            "2010-06-15".parse().unwrap(),
            "2010-06-15T00:01:40Z".parse().unwrap(),
        );
        DatasetRecord {
            id: DatasetId::new(),
            dataset_type: descriptor.dataset_type,
            observation: descriptor.observation_id,
            location: descriptor.location,
            dimensions: descriptor.dimensions,
            metadata: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn reads_registered_bands_and_fails_on_missing_ones() {
        let reader = InMemorySourceReader::new();
        let dataset = a_dataset();
        let storage_type = ls5tm_storage_type();
        let measurement = &storage_type.measurements[0];

        let band = SourceBand {
            grid: crate::typed_grid::TypedGrid::I16(
                Grid2D::new([2, 2].into(), vec![1, 2, 3, 4], Some(-999)).unwrap(),
            ),
            geo_transform: GeoTransform::new((140., -35.).into(), 0.5, -0.5),
            spatial_reference: SpatialReference::epsg_4326(),
        };
        reader.add_band(dataset.id, "B10", band.clone());

        assert_eq!(
            reader.read_band(&dataset, measurement).await.unwrap(),
            band
        );
        assert!(matches!(
            reader
                .read_band(&dataset, &storage_type.measurements[1])
                .await
                .unwrap_err(),
            error::Error::Read { .. }
        ));

        reader.mark_broken(dataset.id);
        assert!(reader.read_band(&dataset, measurement).await.is_err());
    }
}
