//! The chunked-array backend seam. A tile file is a chunked n-d container
//! with a JSON header carrying CF metadata and provenance; its byte layout is
//! private to this module, everything else treats locations as opaque URIs.

mod codec;
mod file;
mod in_memory;

pub use file::FileTileStore;
pub use in_memory::InMemoryTileStore;

use crate::error;
use crate::typed_grid::TypedGrid;
use crate::Result;
use async_trait::async_trait;
use geocube_catalogue::provenance::ProvenanceRecord;
use geocube_catalogue::schema::{DimensionProperties, TileIndex};
use geocube_datatypes::dataset::{MeasurementTag, StorageTypeTag};
use geocube_datatypes::primitives::TimeInterval;
use geocube_datatypes::raster::{GeoTransform, GridShape2D, RasterDataType};
use geocube_datatypes::spatial_reference::SpatialReference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A coordinate variable of a tile file, values ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateVariable {
    pub name: String,
    pub values: Vec<f64>,
    pub attributes: DimensionProperties,
}

/// Declaration of one measurement variable of a tile file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementVariable {
    pub tag: MeasurementTag,
    pub data_type: RasterDataType,
    pub no_data_value: f64,
    /// Rows per chunk in the container payload
    pub chunk_rows: usize,
}

/// Everything a tile file knows about itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileFileHeader {
    pub storage_type: StorageTypeTag,
    pub tile_index: TileIndex,
    pub version: u32,
    pub spatial_reference: SpatialReference,
    pub geo_transform: GeoTransform,
    pub shape: GridShape2D,
    pub time: TimeInterval,
    pub coordinates: Vec<CoordinateVariable>,
    pub measurements: Vec<MeasurementVariable>,
    pub provenance: ProvenanceRecord,
    pub global_attributes: BTreeMap<String, String>,
}

/// A decoded tile: header plus one grid per measurement, in declaration
/// order
#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    pub header: TileFileHeader,
    pub bands: Vec<(MeasurementTag, TypedGrid)>,
}

impl TileData {
    pub fn band(&self, tag: &str) -> Option<&TypedGrid> {
        self.bands
            .iter()
            .find(|(band_tag, _)| band_tag.0 == tag)
            .map(|(_, grid)| grid)
    }
}

/// Size and checksum of a written tile representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTile {
    pub bytes: u64,
    pub md5: String,
}

/// Rewrites a location before it is opened, e.g. to attach object-store
/// credentials
pub type UrlSigner = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Byte-level access to tile locations. Implementations exist per URI
/// scheme; the container layout on top is shared.
#[async_trait]
pub trait TileStore: Send + Sync {
    /// The canonical URI for a tile version under this store
    fn location_for(
        &self,
        storage_type: &StorageTypeTag,
        tile_index: TileIndex,
        version: u32,
    ) -> String;

    async fn write_bytes(&self, location: &str, bytes: Vec<u8>) -> Result<()>;
    async fn read_bytes(&self, location: &str) -> Result<Vec<u8>>;
    async fn delete(&self, location: &str) -> Result<()>;
}

/// Encodes and stores a tile; returns the byte size and checksum of the
/// written representation
pub async fn write_tile(
    store: &dyn TileStore,
    location: &str,
    tile: &TileData,
) -> Result<WrittenTile> {
    let bytes = codec::encode(tile)?;
    let written = WrittenTile {
        bytes: bytes.len() as u64,
        md5: format!("{:x}", md5::compute(&bytes)),
    };
    store.write_bytes(location, bytes).await?;
    Ok(written)
}

/// Loads and decodes a tile
pub async fn read_tile(store: &dyn TileStore, location: &str) -> Result<TileData> {
    let bytes = store.read_bytes(location).await?;
    codec::decode(location, &bytes)
}

/// Loads a tile and verifies its checksum against the catalogued one
pub async fn read_tile_verified(
    store: &dyn TileStore,
    location: &str,
    expected_md5: &str,
) -> Result<TileData> {
    let bytes = store.read_bytes(location).await?;
    let actual = format!("{:x}", md5::compute(&bytes));
    snafu::ensure!(
        actual == expected_md5,
        error::ChecksumMismatch {
            location: location.to_string(),
            expected: expected_md5.to_string(),
            actual
        }
    );
    codec::decode(location, &bytes)
}

/// Applies the optional signer to a location
pub fn sign_location(signer: Option<&UrlSigner>, location: &str) -> String {
    match signer {
        Some(signer) => signer(location),
        None => location.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::typed_grid::TypedGrid;
    use geocube_datatypes::primitives::{TimeInstance, TimeInterval};
    use geocube_datatypes::raster::Grid2D;

    /// A small, fully populated tile container
    pub(crate) fn a_tile() -> TileData {
        let grid =
            Grid2D::new([4, 4].into(), (0..16).map(|v| v as i16).collect(), Some(-999)).unwrap();
        TileData {
            header: TileFileHeader {
                storage_type: "LS5TM".into(),
                tile_index: TileIndex {
                    t: 2010,
                    y: -36,
                    x: 140,
                },
                version: 1,
                spatial_reference: SpatialReference::epsg_4326(),
                geo_transform: GeoTransform::new((140., -35.).into(), 0.25, -0.25),
                shape: [4, 4].into(),
                time: TimeInterval::new_unchecked(
                    TimeInstance::from_millis_unchecked(0),
                    TimeInstance::from_millis_unchecked(1000),
                ),
                coordinates: vec![CoordinateVariable {
                    name: "longitude".to_string(),
                    values: vec![140.125, 140.375, 140.625, 140.875],
                    attributes: DimensionProperties::longitude(),
                }],
                measurements: vec![MeasurementVariable {
                    tag: "B10".into(),
                    data_type: RasterDataType::I16,
                    no_data_value: -999.,
                    chunk_rows: 3,
                }],
                provenance: ProvenanceRecord::default(),
                global_attributes: [("title".to_string(), "test".to_string())]
                    .into_iter()
                    .collect(),
            },
            bands: vec![("B10".into(), TypedGrid::I16(grid))],
        }
    }
}
