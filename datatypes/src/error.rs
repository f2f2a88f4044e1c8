use crate::primitives::{Coordinate2D, TimeInstance};
use crate::spatial_reference::SpatialReference;
use snafu::prelude::*;
use strum::IntoStaticStr;

#[derive(Debug, Snafu, IntoStaticStr)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))] // disables default `Snafu` suffix
pub enum Error {
    #[snafu(display(
        "Tried to create a bounding box with lower left {:?} and upper right {:?}",
        lower_left_coordinate,
        upper_right_coordinate
    ))]
    InvalidBoundingBox {
        lower_left_coordinate: Coordinate2D,
        upper_right_coordinate: Coordinate2D,
    },

    #[snafu(display("Time interval must start before it ends, got [{}, {})", start, end))]
    TimeIntervalStartAfterEnd { start: TimeInstance, end: TimeInstance },

    #[snafu(display("Time instance must be between {} and {}, but is {}", min, max, is))]
    TimeInstanceOutOfBounds { min: i64, max: i64, is: i64 },

    #[snafu(display("Date string could not be parsed: {}", input))]
    TimeParse { input: String },

    #[snafu(display("A spatial resolution must be positive, got ({}, {})", x, y))]
    InvalidSpatialResolution { x: f64, y: f64 },

    #[snafu(display("InvalidSpatialReferenceString: {}", spatial_reference_string))]
    InvalidSpatialReferenceString { spatial_reference_string: String },

    #[snafu(display("No transform is defined from {} to {}", from, to))]
    NoTransform {
        from: SpatialReference,
        to: SpatialReference,
    },

    #[snafu(display("Reprojection of {:?} from {} to {} produced no valid coordinates", coordinate, from, to))]
    Reproject {
        coordinate: Coordinate2D,
        from: SpatialReference,
        to: SpatialReference,
    },

    #[snafu(display("Reprojecting the region {:?} yielded no valid pixels", region))]
    EmptyReprojectedRegion { region: String },

    #[snafu(display("A regular dimension needs a positive extent, got {}", extent))]
    InvalidDimensionExtent { extent: f64 },

    #[snafu(display("An irregular dimension needs at least two sorted boundaries"))]
    InvalidIrregularBoundaries,

    #[snafu(display("Value {} is outside of the dimension's indexing table", value))]
    ValueOutsideIndexingTable { value: f64 },

    #[snafu(display("Index {} is not part of the dimension's enumeration", index))]
    UnknownIndex { index: i64 },

    #[snafu(display("Tag `{}` is not part of the dimension's enumeration", tag))]
    UnknownIndexTag { tag: String },

    #[snafu(display(
        "Grid data length {} does not match the shape {:?}",
        data_len,
        shape
    ))]
    GridDataLengthMismatch { data_len: usize, shape: [usize; 2] },

    #[snafu(display("Grid index ({}, {}) is out of bounds for shape {:?}", y, x, shape))]
    GridIndexOutOfBounds { y: usize, x: usize, shape: [usize; 2] },

    #[snafu(display("Raster value {} cannot be represented as {}", value, data_type))]
    UnrepresentableRasterValue { value: f64, data_type: String },
}
