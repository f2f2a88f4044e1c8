use serde::{Deserialize, Serialize};

/// A primitive axis, e.g. longitude or time. Names and tags are unique
/// process-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub name: String,
    pub tag: String,
}

/// A grouping of dimensions that share a reference system, e.g. spatial-XY
/// or temporal. A dimension may belong to several domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub name: String,
    pub tag: String,
    pub dimensions: Vec<String>,
}

/// Either a geospatial CRS identified by its authority string, or a 1-D axis
/// system such as `seconds since 1970-01-01` or a band enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSystem {
    pub name: String,
    pub unit: String,
    /// Authority string for CRS, free text for axis systems
    pub definition: String,
    pub tag: String,
    /// Offset added to raw dimension indices to express tile indices in this
    /// system's unit, e.g. `1970` for a calendar-year index system over a
    /// seconds-since-epoch axis
    #[serde(default)]
    pub index_origin: i64,
}

/// CF attributes attached to a storage-type dimension, written into every
/// tile's coordinate variables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionProperties {
    pub axis: Option<String>,
    pub standard_name: Option<String>,
    pub long_name: Option<String>,
    pub units: Option<String>,
    pub calendar: Option<String>,
}

impl DimensionProperties {
    pub fn longitude() -> Self {
        Self {
            axis: Some("X".into()),
            standard_name: Some("longitude".into()),
            long_name: Some("longitude".into()),
            units: Some("degrees_east".into()),
            calendar: None,
        }
    }

    pub fn latitude() -> Self {
        Self {
            axis: Some("Y".into()),
            standard_name: Some("latitude".into()),
            long_name: Some("latitude".into()),
            units: Some("degrees_north".into()),
            calendar: None,
        }
    }

    pub fn time() -> Self {
        Self {
            axis: Some("T".into()),
            standard_name: Some("time".into()),
            long_name: Some("time".into()),
            units: Some("seconds since 1970-01-01 00:00:00".into()),
            calendar: Some("gregorian".into()),
        }
    }
}
