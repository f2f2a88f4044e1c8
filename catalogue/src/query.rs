//! Catalogue query types: conjunctions of per-dimension range constraints
//! plus entity filters.

use crate::schema::TileIndex;
use geocube_datatypes::dataset::{DatasetTypeTag, ObservationId, StorageTypeTag};
use geocube_datatypes::primitives::{BoundingBox2D, TimeInterval};
use serde::{Deserialize, Serialize};

/// An open or closed range constraint on one continuous dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub dimension: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl DimensionRange {
    /// Whether a `[min_value, max_value]` extent intersects this range;
    /// boundaries are inclusive
    pub fn matches(&self, min_value: f64, max_value: f64) -> bool {
        self.min.map_or(true, |min| max_value >= min)
            && self.max.map_or(true, |max| min_value <= max)
    }
}

/// Which datasets intersect a region, optionally filtered by type and
/// observation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetQuery {
    #[serde(default)]
    pub dataset_types: Option<Vec<DatasetTypeTag>>,
    #[serde(default)]
    pub observation: Option<ObservationId>,
    /// Spatial constraint over the longitude/latitude dimensions
    #[serde(default)]
    pub spatial: Option<BoundingBox2D>,
    #[serde(default)]
    pub time: Option<TimeInterval>,
    /// Further per-dimension constraints, conjunctive
    #[serde(default)]
    pub dimension_ranges: Vec<DimensionRange>,
}

impl DatasetQuery {
    /// Datasets intersecting one storage-type tile
    pub fn for_tile(
        dataset_types: Vec<DatasetTypeTag>,
        spatial: BoundingBox2D,
        time: TimeInterval,
    ) -> Self {
        Self {
            dataset_types: Some(dataset_types),
            observation: None,
            spatial: Some(spatial),
            time: Some(time),
            dimension_ranges: Vec::new(),
        }
    }
}

/// Which storage units answer a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUnitQuery {
    pub storage_type: StorageTypeTag,
    /// Restrict to an explicit set of tile indices
    #[serde(default)]
    pub tile_indices: Option<Vec<TileIndex>>,
    #[serde(default)]
    pub spatial: Option<BoundingBox2D>,
    #[serde(default)]
    pub time: Option<TimeInterval>,
    /// Also return archived versions
    #[serde(default)]
    pub include_archived: bool,
    /// Only the most recent returned version per tile
    #[serde(default)]
    pub latest_only: bool,
}

impl StorageUnitQuery {
    pub fn latest_active(storage_type: StorageTypeTag) -> Self {
        Self {
            storage_type,
            tile_indices: None,
            spatial: None,
            time: None,
            include_archived: false,
            latest_only: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ended_ranges_match_accordingly() {
        let range = DimensionRange {
            dimension: "height".into(),
            min: Some(100.),
            max: None,
        };
        assert!(range.matches(50., 150.));
        assert!(range.matches(100., 100.));
        assert!(!range.matches(0., 99.));

        let unbounded = DimensionRange {
            dimension: "height".into(),
            min: None,
            max: None,
        };
        assert!(unbounded.matches(f64::MIN, f64::MAX));
    }
}
