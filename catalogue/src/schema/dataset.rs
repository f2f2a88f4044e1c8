use super::MeasurementType;
use geocube_datatypes::dataset::{DatasetId, DatasetTypeTag, ObservationId};
use geocube_datatypes::primitives::{BoundingBox2D, TimeInstance, TimeInterval};
use serde::{Deserialize, Serialize};

/// A class of source data, e.g. NBAR or PQ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetType {
    pub tag: DatasetTypeTag,
    pub name: String,
    /// Ordered by `measurement_type_index`
    pub measurements: Vec<MeasurementType>,
    /// Tags of the domains the dataset type spans
    pub domains: Vec<String>,
}

/// A scene-level acquisition. Multiple datasets may share an observation,
/// e.g. the NBAR and PQ products of the same scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    pub id: ObservationId,
    pub observation_type: String,
    pub start_datetime: TimeInstance,
    pub end_datetime: TimeInstance,
    pub instrument: String,
    pub platform: String,
}

impl ObservationRecord {
    pub fn time_interval(&self) -> TimeInterval {
        TimeInterval::new_unchecked(self.start_datetime, self.end_datetime)
    }
}

/// Extent of a dataset along one dimension. `indexing_value` is preserved
/// verbatim from the descriptor and not interpreted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDimension {
    pub dimension: String,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default)]
    pub indexing_value: Option<f64>,
}

/// A concrete source file; immutable once catalogued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    pub id: DatasetId,
    pub dataset_type: DatasetTypeTag,
    pub observation: ObservationId,
    pub location: String,
    pub dimensions: Vec<DatasetDimension>,
    /// Free-form metadata blob, preserved verbatim
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl DatasetRecord {
    pub fn dimension(&self, name: &str) -> Option<&DatasetDimension> {
        self.dimensions.iter().find(|d| d.dimension == name)
    }

    /// Spatial envelope from the longitude/latitude dimension records
    pub fn spatial_bounds(&self) -> Option<BoundingBox2D> {
        let x = self.dimension("longitude")?;
        let y = self.dimension("latitude")?;
        Some(BoundingBox2D::new_unchecked(
            (x.min_value, y.min_value).into(),
            (x.max_value, y.max_value).into(),
        ))
    }
}
