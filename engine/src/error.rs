use geocube_datatypes::dataset::DatasetId;
use snafu::prelude::*;
use strum::IntoStaticStr;

#[derive(Debug, Snafu, IntoStaticStr)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))] // disables default `Snafu` suffix
pub enum Error {
    DataType {
        source: geocube_datatypes::error::Error,
    },

    Catalogue {
        source: geocube_catalogue::error::Error,
    },

    #[snafu(display("Source dataset {} could not be read: {}", dataset, reason))]
    Read {
        dataset: DatasetId,
        reason: String,
    },

    #[snafu(display("Reprojection failed: {}", source))]
    Reproject {
        source: geocube_datatypes::error::Error,
    },

    #[snafu(display("Tile file `{}` could not be written: {}", location, reason))]
    Write {
        #[snafu(implicit(false))]
        location: String,
        reason: String,
    },

    #[snafu(display("Tile file `{}` could not be opened: {}", location, reason))]
    TileUnreadable {
        #[snafu(implicit(false))]
        location: String,
        reason: String,
    },

    #[snafu(display(
        "Checksum of `{}` does not match the catalogue: expected {}, got {}",
        location,
        expected,
        actual
    ))]
    ChecksumMismatch {
        #[snafu(implicit(false))]
        location: String,
        expected: String,
        actual: String,
    },

    #[snafu(display("No deterministic fusion order: {}", reason))]
    FusionConflict {
        reason: String,
    },

    #[snafu(display("Malformed query: {}", reason))]
    Query {
        reason: String,
    },

    #[snafu(display(
        "The time selector only accepts date instants or calendar strings, got a bare number"
    ))]
    TimeSelectorType,

    #[snafu(display("Measurement `{}` is not part of the storage type", tag))]
    UnknownMeasurement {
        tag: String,
    },

    #[snafu(display(
        "Dataset {} carries no extent for dimension `{}`",
        dataset,
        dimension
    ))]
    DatasetMissingDimension {
        dataset: DatasetId,
        dimension: String,
    },

    #[snafu(display(
        "Band `{}` has datatype {} in the tile but {} in the declaration",
        tag,
        found,
        expected
    ))]
    BandDataTypeMismatch {
        tag: String,
        found: String,
        expected: String,
    },

    #[snafu(display("The operation was cancelled"))]
    Cancelled,

    #[snafu(display("The tile task ended without reporting a result"))]
    TaskAborted,

    #[snafu(display("`{}` timed out after {} ms; the operation may be retried", operation, millis))]
    Timeout {
        operation: String,
        millis: u64,
    },

    SerdeJson {
        source: serde_json::Error,
    },

    Io {
        source: std::io::Error,
    },
}

impl From<geocube_datatypes::error::Error> for Error {
    fn from(source: geocube_datatypes::error::Error) -> Self {
        Self::DataType { source }
    }
}

impl From<geocube_catalogue::error::Error> for Error {
    fn from(source: geocube_catalogue::error::Error) -> Self {
        Self::Catalogue { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::SerdeJson { source }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

impl Error {
    /// Whether a retry can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
