use geocube_datatypes::dataset::MeasurementTag;
use geocube_datatypes::raster::RasterDataType;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// How source pixels are resampled onto a tile grid
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ResamplingMethod {
    Nearest,
    Bilinear,
}

impl Default for ResamplingMethod {
    fn default() -> Self {
        Self::Nearest
    }
}

/// A named, typed band within a dataset or storage type. Ordered by a unique
/// `measurement_type_index` starting at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementType {
    pub tag: MeasurementTag,
    pub name: String,
    pub data_type: RasterDataType,
    pub no_data_value: f64,
    #[serde(default)]
    pub resampling_method: ResamplingMethod,
    /// Variable name in the source file, when it differs from the tag
    #[serde(default)]
    pub src_varname: Option<String>,
    #[serde(default)]
    pub compression: Option<String>,
    pub measurement_type_index: u16,
}
