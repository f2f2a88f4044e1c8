//! Provenance is recorded twice: embedded in every tile file and relationally
//! in the catalogue, so provenance queries never need to open a file.

use crate::schema::ResamplingMethod;
use geocube_datatypes::dataset::{DatasetId, MeasurementTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A source dataset that was skipped during ingest, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedDataset {
    pub dataset: DatasetId,
    pub reason: String,
}

/// Everything a tile knows about where it came from
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceRecord {
    /// Source datasets in the fusion order that was applied, bottom-most
    /// first
    pub fusion_order: Vec<DatasetId>,
    /// Datasets skipped under `skip_broken_datasets`
    #[serde(default)]
    pub skipped_datasets: Vec<SkippedDataset>,
    /// Resampling method applied per band
    pub resampling: BTreeMap<MeasurementTag, ResamplingMethod>,
    /// Version of the ingestor software that wrote the tile
    pub ingestor_version: String,
}

impl ProvenanceRecord {
    pub fn source_datasets(&self) -> &[DatasetId] {
        &self.fusion_order
    }
}
