use geocube_datatypes::dataset::{StorageTypeTag, StorageUnitId};
use geocube_datatypes::primitives::{BoundingBox2D, TimeInstance};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Position of a tile in the cube grid, expressed in the storage type's
/// index reference systems
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct TileIndex {
    pub t: i64,
    pub y: i64,
    pub x: i64,
}

impl std::fmt::Display for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.t, self.y, self.x)
    }
}

/// Lifecycle state of a storage unit version
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum StorageUnitStatus {
    /// Candidate for queries and fusion
    Active,
    /// Still resolvable but no longer a candidate for new queries
    Archived,
    /// Removed from the candidate set entirely; the file remains on disk
    Forgotten,
}

/// Per-dimension record of a storage unit. For regular dimensions the values
/// satisfy `min = origin + raw_index * extent`, `max = min + extent`; for
/// fixed dimensions `min == max == index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUnitDimension {
    pub dimension: String,
    pub index: i64,
    pub min_value: f64,
    pub max_value: f64,
}

/// A materialised cube chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUnitRecord {
    pub id: StorageUnitId,
    pub storage_type: StorageTypeTag,
    pub tile_index: TileIndex,
    pub version: u32,
    /// URI of the tile file; unique across the catalogue
    pub location: String,
    pub md5: String,
    pub bytes: u64,
    pub footprint: BoundingBox2D,
    pub dimensions: Vec<StorageUnitDimension>,
    pub status: StorageUnitStatus,
    pub created: TimeInstance,
}

impl StorageUnitRecord {
    pub fn is_query_candidate(&self) -> bool {
        self.status == StorageUnitStatus::Active
    }
}
