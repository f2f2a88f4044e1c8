use crate::identifier;
use serde::{Deserialize, Serialize};

identifier!(DatasetId);
identifier!(ObservationId);
identifier!(StorageUnitId);

/// Tag of a dataset type, e.g. `NBAR` or `PQ`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatasetTypeTag(pub String);

/// Tag of a storage type, e.g. `LS5TM`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StorageTypeTag(pub String);

/// Tag of a measurement type, e.g. `B40`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeasurementTag(pub String);

macro_rules! impl_tag_conversions {
    ($tag:ident) => {
        impl From<&str> for $tag {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $tag {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

impl_tag_conversions!(DatasetTypeTag);
impl_tag_conversions!(StorageTypeTag);
impl_tag_conversions!(MeasurementTag);

impl std::fmt::Display for DatasetTypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for StorageTypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for MeasurementTag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
