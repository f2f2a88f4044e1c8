use geocube_datatypes::dataset::{DatasetId, ObservationId, StorageTypeTag, StorageUnitId};
use snafu::prelude::*;
use strum::IntoStaticStr;

#[derive(Debug, Snafu, IntoStaticStr)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))] // disables default `Snafu` suffix
pub enum Error {
    DataType {
        source: geocube_datatypes::error::Error,
    },

    #[snafu(display("Invalid schema declaration: {}", reason))]
    Schema {
        reason: String,
    },

    #[snafu(display("Referenced observation {} is not catalogued", observation))]
    LineageObservationMissing {
        observation: ObservationId,
    },

    #[snafu(display("Referenced dataset {} is not catalogued", dataset))]
    LineageDatasetMissing {
        dataset: DatasetId,
    },

    #[snafu(display("A storage unit must reference at least one source dataset"))]
    LineageEmpty,

    #[snafu(display("Tried to create duplicate: {}", reason))]
    Conflict {
        reason: String,
    },

    #[snafu(display(
        "Version {} is not an increment of the latest version {} for this tile",
        version,
        latest
    ))]
    VersionNotMonotonic {
        version: u32,
        latest: u32,
    },

    #[snafu(display("Unknown storage type `{}`", tag))]
    UnknownStorageType {
        tag: StorageTypeTag,
    },

    #[snafu(display("Unknown dataset type `{}`", tag))]
    UnknownDatasetType {
        tag: String,
    },

    #[snafu(display("Unknown dataset {}", dataset))]
    UnknownDataset {
        dataset: DatasetId,
    },

    #[snafu(display("Unknown observation {}", observation))]
    UnknownObservation {
        observation: ObservationId,
    },

    #[snafu(display("Unknown storage unit {}", unit))]
    UnknownStorageUnit {
        unit: StorageUnitId,
    },

    #[snafu(display("Storage unit {} is forgotten and can no longer be restored", unit))]
    StorageUnitForgotten {
        unit: StorageUnitId,
    },

    #[snafu(display(
        "Dimension record `{}` of the storage unit does not agree with its tile index: \
         expected [{}, {}], got [{}, {}]",
        dimension,
        expected_min,
        expected_max,
        min,
        max
    ))]
    InconsistentUnitDimension {
        dimension: String,
        expected_min: f64,
        expected_max: f64,
        min: f64,
        max: f64,
    },

    #[snafu(display("The transaction was already closed"))]
    TransactionClosed,

    #[snafu(display("Parameter {} must have length between {} and {}", parameter, min, max))]
    InvalidStringLength {
        parameter: String,
        min: usize,
        max: usize,
    },
}

impl From<geocube_datatypes::error::Error> for Error {
    fn from(source: geocube_datatypes::error::Error) -> Self {
        Self::DataType { source }
    }
}
