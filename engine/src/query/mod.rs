//! Spatiotemporal selection across storage types: the query boundary types,
//! the planner that resolves them into covering tile sets, and the lazy
//! array the planner returns.

mod lazy;
mod planner;

pub use lazy::{LazyArray, MaterialisedArray, OutputDescriptor, PlannedTile, TimeGroup, TimeSlice};
pub use planner::QueryPlanner;

use crate::error;
use crate::storage::UrlSigner;
use crate::Result;
use geocube_catalogue::schema::DatasetRecord;
use geocube_datatypes::dataset::{DatasetTypeTag, StorageTypeTag};
use geocube_datatypes::primitives::{BoundingBox2D, SpatialResolution, TimeInstance, TimeInterval};
use geocube_datatypes::spatial_reference::SpatialReference;
use std::sync::Arc;

/// Which product a query addresses: a storage type directly, or a set of
/// compatible dataset types the planner resolves to one
#[derive(Debug, Clone, PartialEq)]
pub enum ProductSelector {
    StorageType(StorageTypeTag),
    DatasetTypes(Vec<DatasetTypeTag>),
}

/// A selector on a continuous spatial dimension. A single value is a closed
/// singleton range with half-pixel tolerance; one-sided ranges are open
/// towards the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeSelector {
    Value(f64),
    Range { min: Option<f64>, max: Option<f64> },
}

impl RangeSelector {
    pub fn all() -> Self {
        Self::Range {
            min: None,
            max: None,
        }
    }

    pub fn closed(min: f64, max: f64) -> Self {
        Self::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    /// The closed bounds, expanding single values by half a pixel
    pub fn bounds(&self, half_pixel: f64) -> (Option<f64>, Option<f64>) {
        match *self {
            Self::Value(value) => (Some(value - half_pixel), Some(value + half_pixel)),
            Self::Range { min, max } => (min, max),
        }
    }
}

/// A selector on the time dimension. Both ends are inclusive to a
/// millisecond tolerance; half-open ranges are accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSelector {
    Instant(TimeInstance),
    Range {
        start: Option<TimeInstance>,
        end: Option<TimeInstance>,
    },
}

impl TimeSelector {
    pub fn all() -> Self {
        Self::Range {
            start: None,
            end: None,
        }
    }

    pub fn range(start: TimeInstance, end: TimeInstance) -> Self {
        Self::Range {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Parses the boundary representation: a date string, or a one/two
    /// element array of date strings and nulls. Bare numbers are ambiguous
    /// on the time dimension and rejected with a type error.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        let instant = |value: &Value| -> Result<Option<TimeInstance>> {
            match value {
                Value::Null => Ok(None),
                Value::String(s) => {
                    Ok(Some(s.parse().map_err(|_| error::Error::Query {
                        reason: format!("`{s}` is not a date instant"),
                    })?))
                }
                Value::Number(_) => Err(error::Error::TimeSelectorType),
                other => Err(error::Error::Query {
                    reason: format!("unsupported time selector `{other}`"),
                }),
            }
        };

        match value {
            Value::String(s) => Ok(Self::Instant(s.parse().map_err(|_| {
                error::Error::Query {
                    reason: format!("`{s}` is not a date instant"),
                }
            })?)),
            Value::Number(_) => Err(error::Error::TimeSelectorType),
            Value::Array(items) => match items.as_slice() {
                [only] => Ok(Self::Instant(instant(only)?.ok_or(
                    error::Error::Query {
                        reason: "a singleton time selector must not be null".to_string(),
                    },
                )?)),
                [start, end] => Ok(Self::Range {
                    start: instant(start)?,
                    end: instant(end)?,
                }),
                _ => Err(error::Error::Query {
                    reason: "time selectors take at most two elements".to_string(),
                }),
            },
            other => Err(error::Error::Query {
                reason: format!("unsupported time selector `{other}`"),
            }),
        }
    }

    /// The interval to intersect with, inclusive on both ends to a
    /// millisecond
    pub fn to_interval(&self) -> TimeInterval {
        let (start, end) = match *self {
            Self::Instant(instant) => (instant, instant),
            Self::Range { start, end } => (
                start.unwrap_or(TimeInstance::MIN),
                end.unwrap_or(TimeInstance::MAX),
            ),
        };
        let inclusive_end = end.checked_add_millis(1).unwrap_or(TimeInstance::MAX);
        TimeInterval::new_unchecked(start, inclusive_end)
    }
}

/// How observations group along the output time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    /// Group by the solar day at the footprint centroid, northern scene on
    /// top
    #[default]
    SolarDay,
    /// Keep distinct timestamps apart
    Time,
}

/// Target reference system, resolution and bounding geometry of the output
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGeometry {
    pub spatial_reference: SpatialReference,
    pub resolution: Option<SpatialResolution>,
    pub bounds: Option<BoundingBox2D>,
}

impl OutputGeometry {
    pub fn reprojected(spatial_reference: SpatialReference, resolution: SpatialResolution) -> Self {
        Self {
            spatial_reference,
            resolution: Some(resolution),
            bounds: None,
        }
    }

    /// The geometry of an existing array, for "like" queries
    pub fn like(array: &LazyArray) -> Self {
        let output = array.output();
        Self {
            spatial_reference: output.spatial_reference,
            resolution: Some(output.resolution),
            bounds: Some(output.bounds),
        }
    }
}

/// Filters candidate source datasets before grouping
pub type DatasetPredicate = Arc<dyn Fn(&DatasetRecord) -> bool + Send + Sync>;

/// A load request: product, region, time, bands and output geometry
#[derive(Clone)]
pub struct CubeQuery {
    pub product: ProductSelector,
    /// Selector on the x axis, in the output reference system if one is set
    pub x: RangeSelector,
    /// Selector on the y axis, in the output reference system if one is set
    pub y: RangeSelector,
    pub time: TimeSelector,
    /// Bands to load; `None` loads all, ordered by measurement index
    pub measurements: Option<Vec<String>>,
    pub output: Option<OutputGeometry>,
    pub group_by: GroupBy,
    /// Tiles that cannot be read are skipped instead of failing the query
    pub skip_broken_datasets: bool,
    pub dataset_predicate: Option<DatasetPredicate>,
    /// Invoked on each tile location before it is opened
    pub url_signer: Option<UrlSigner>,
}

impl CubeQuery {
    /// A query over everything a storage type holds
    pub fn everything(storage_type: StorageTypeTag) -> Self {
        Self {
            product: ProductSelector::StorageType(storage_type),
            x: RangeSelector::all(),
            y: RangeSelector::all(),
            time: TimeSelector::all(),
            measurements: None,
            output: None,
            group_by: GroupBy::default(),
            skip_broken_datasets: false,
            dataset_predicate: None,
            url_signer: None,
        }
    }
}
