//! Grids tagged with their runtime datatype, plus the resampling kernel that
//! moves pixels between grids of different placement and reference system.

use crate::error;
use crate::Result;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use geocube_catalogue::schema::ResamplingMethod;
use geocube_datatypes::operations::reproject::{
    CoordinateProjection, CoordinateProjector,
};
use geocube_datatypes::primitives::Coordinate2D;
use geocube_datatypes::raster::{GeoTransform, Grid2D, GridShape2D, Pixel, RasterDataType};
use geocube_datatypes::spatial_reference::SpatialReference;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// A `Grid2D` whose element type is only known at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataType", content = "grid")]
pub enum TypedGrid {
    U8(Grid2D<u8>),
    U16(Grid2D<u16>),
    U32(Grid2D<u32>),
    U64(Grid2D<u64>),
    I8(Grid2D<i8>),
    I16(Grid2D<i16>),
    I32(Grid2D<i32>),
    I64(Grid2D<i64>),
    F32(Grid2D<f32>),
    F64(Grid2D<f64>),
}

/// Calls `$body` with `$grid` bound to the inner `Grid2D` of any variant
macro_rules! map_typed_grid {
    ($typed:expr, $grid:ident => $body:expr) => {
        match $typed {
            TypedGrid::U8($grid) => $body,
            TypedGrid::U16($grid) => $body,
            TypedGrid::U32($grid) => $body,
            TypedGrid::U64($grid) => $body,
            TypedGrid::I8($grid) => $body,
            TypedGrid::I16($grid) => $body,
            TypedGrid::I32($grid) => $body,
            TypedGrid::I64($grid) => $body,
            TypedGrid::F32($grid) => $body,
            TypedGrid::F64($grid) => $body,
        }
    };
}

impl TypedGrid {
    /// A nodata-filled grid of the given datatype
    pub fn filled_with_no_data(
        data_type: RasterDataType,
        shape: GridShape2D,
        no_data_value: f64,
    ) -> Self {
        fn make<T: Pixel>(shape: GridShape2D, no_data_value: f64) -> Grid2D<T> {
            let no_data = T::from_f64_lossy(no_data_value);
            Grid2D::new_filled(shape, no_data, Some(no_data))
        }

        match data_type {
            RasterDataType::U8 => Self::U8(make(shape, no_data_value)),
            RasterDataType::U16 => Self::U16(make(shape, no_data_value)),
            RasterDataType::U32 => Self::U32(make(shape, no_data_value)),
            RasterDataType::U64 => Self::U64(make(shape, no_data_value)),
            RasterDataType::I8 => Self::I8(make(shape, no_data_value)),
            RasterDataType::I16 => Self::I16(make(shape, no_data_value)),
            RasterDataType::I32 => Self::I32(make(shape, no_data_value)),
            RasterDataType::I64 => Self::I64(make(shape, no_data_value)),
            RasterDataType::F32 => Self::F32(make(shape, no_data_value)),
            RasterDataType::F64 => Self::F64(make(shape, no_data_value)),
        }
    }

    pub fn data_type(&self) -> RasterDataType {
        match self {
            Self::U8(_) => RasterDataType::U8,
            Self::U16(_) => RasterDataType::U16,
            Self::U32(_) => RasterDataType::U32,
            Self::U64(_) => RasterDataType::U64,
            Self::I8(_) => RasterDataType::I8,
            Self::I16(_) => RasterDataType::I16,
            Self::I32(_) => RasterDataType::I32,
            Self::I64(_) => RasterDataType::I64,
            Self::F32(_) => RasterDataType::F32,
            Self::F64(_) => RasterDataType::F64,
        }
    }

    pub fn shape(&self) -> GridShape2D {
        map_typed_grid!(self, grid => grid.shape())
    }

    pub fn no_data_value_f64(&self) -> Option<f64> {
        map_typed_grid!(self, grid => grid.no_data_value().map(|v| v.as_()))
    }

    /// The value at `(y, x)` as `f64`, or `None` when out of bounds or
    /// nodata
    pub fn sample_f64(&self, y: isize, x: isize) -> Option<f64> {
        if y < 0 || x < 0 {
            return None;
        }
        map_typed_grid!(self, grid => {
            let value = grid.value_at_grid_index(y as usize, x as usize).ok()?;
            if grid.is_no_data(value) {
                return None;
            }
            Some(value.as_())
        })
    }

    /// Writes `value` at `(y, x)`, casting into the grid's datatype
    pub fn set_f64(&mut self, y: usize, x: usize, value: f64) -> Result<()> {
        map_typed_grid!(self, grid => {
            grid.set_at_grid_index(y, x, Pixel::from_f64_lossy(value))?;
        });
        Ok(())
    }

    /// The typed view, when the element type matches
    pub fn as_grid<T: Pixel>(&self) -> Option<&Grid2D<T>> {
        fn cast<A: 'static, B: 'static>(grid: &Grid2D<A>) -> Option<&Grid2D<B>>
        where
            A: Pixel,
            B: Pixel,
        {
            (grid as &dyn std::any::Any).downcast_ref::<Grid2D<B>>()
        }
        map_typed_grid!(self, grid => cast::<_, T>(grid))
    }

    /// Raw little-endian encoding of the grid's elements, row-major
    pub fn to_le_bytes(&self) -> Vec<u8> {
        map_typed_grid!(self, grid => {
            let mut bytes =
                Vec::with_capacity(grid.shape().number_of_elements() * self.data_type().byte_size());
            for value in grid.data() {
                value.write_le(&mut bytes);
            }
            bytes
        })
    }

    /// Decodes a grid from its raw little-endian encoding
    pub fn from_le_bytes(
        data_type: RasterDataType,
        shape: GridShape2D,
        no_data_value: f64,
        bytes: &[u8],
    ) -> Result<Self> {
        fn decode<T: Pixel + LittleEndianPixel>(
            shape: GridShape2D,
            no_data_value: f64,
            bytes: &[u8],
        ) -> Result<Grid2D<T>> {
            let mut cursor = Cursor::new(bytes);
            let mut data = Vec::with_capacity(shape.number_of_elements());
            for _ in 0..shape.number_of_elements() {
                data.push(T::read_le(&mut cursor)?);
            }
            Ok(Grid2D::new(
                shape,
                data,
                Some(T::from_f64_lossy(no_data_value)),
            )?)
        }

        Ok(match data_type {
            RasterDataType::U8 => Self::U8(decode(shape, no_data_value, bytes)?),
            RasterDataType::U16 => Self::U16(decode(shape, no_data_value, bytes)?),
            RasterDataType::U32 => Self::U32(decode(shape, no_data_value, bytes)?),
            RasterDataType::U64 => Self::U64(decode(shape, no_data_value, bytes)?),
            RasterDataType::I8 => Self::I8(decode(shape, no_data_value, bytes)?),
            RasterDataType::I16 => Self::I16(decode(shape, no_data_value, bytes)?),
            RasterDataType::I32 => Self::I32(decode(shape, no_data_value, bytes)?),
            RasterDataType::I64 => Self::I64(decode(shape, no_data_value, bytes)?),
            RasterDataType::F32 => Self::F32(decode(shape, no_data_value, bytes)?),
            RasterDataType::F64 => Self::F64(decode(shape, no_data_value, bytes)?),
        })
    }
}

/// Little-endian element IO, used by the chunked tile container
trait LittleEndianPixel: Sized {
    fn write_le(&self, out: &mut Vec<u8>);
    fn read_le(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Self>;
}

macro_rules! impl_little_endian_pixel {
    ($t:ty, $write:ident, $read:ident) => {
        impl LittleEndianPixel for $t {
            fn write_le(&self, out: &mut Vec<u8>) {
                out.$write::<LittleEndian>(*self).expect("vec write");
            }

            fn read_le(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
                cursor.$read::<LittleEndian>()
            }
        }
    };
}

impl LittleEndianPixel for u8 {
    fn write_le(&self, out: &mut Vec<u8>) {
        out.write_u8(*self).expect("vec write");
    }

    fn read_le(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        cursor.read_u8()
    }
}

impl LittleEndianPixel for i8 {
    fn write_le(&self, out: &mut Vec<u8>) {
        out.write_i8(*self).expect("vec write");
    }

    fn read_le(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        cursor.read_i8()
    }
}

impl_little_endian_pixel!(u16, write_u16, read_u16);
impl_little_endian_pixel!(u32, write_u32, read_u32);
impl_little_endian_pixel!(u64, write_u64, read_u64);
impl_little_endian_pixel!(i16, write_i16, read_i16);
impl_little_endian_pixel!(i32, write_i32, read_i32);
impl_little_endian_pixel!(i64, write_i64, read_i64);
impl_little_endian_pixel!(f32, write_f32, read_f32);
impl_little_endian_pixel!(f64, write_f64, read_f64);

/// Moves pixels from `source` into `target`, projecting each target pixel
/// centre into the source placement and sampling there. Target cells whose
/// centre falls outside the source, or samples nodata, are left untouched.
///
/// Returns the number of cells written.
pub fn warp_into(
    target: &mut TypedGrid,
    target_geo_transform: GeoTransform,
    target_spatial_reference: SpatialReference,
    source: &TypedGrid,
    source_geo_transform: GeoTransform,
    source_spatial_reference: SpatialReference,
    method: ResamplingMethod,
) -> Result<usize> {
    let projector = if target_spatial_reference.is_equivalent(&source_spatial_reference) {
        None
    } else {
        Some(
            CoordinateProjector::from_known_srs(
                target_spatial_reference,
                source_spatial_reference,
            )
            .map_err(|source| error::Error::Reproject { source })?,
        )
    };

    let shape = target.shape();
    let mut written = 0;

    for y in 0..shape.axis_size_y() {
        for x in 0..shape.axis_size_x() {
            let centre = target_geo_transform.pixel_center_coordinate_2d((y, x));
            let source_coordinate = match &projector {
                None => centre,
                Some(projector) => match projector.project_coordinate(centre) {
                    Ok(coordinate) => coordinate,
                    // outside the transform's domain: stays nodata
                    Err(_) => continue,
                },
            };

            if let Some(value) = sample(source, source_geo_transform, source_coordinate, method)
            {
                target.set_f64(y, x, value)?;
                written += 1;
            }
        }
    }

    Ok(written)
}

/// Samples `source` at a coordinate in its own reference system
fn sample(
    source: &TypedGrid,
    source_geo_transform: GeoTransform,
    coordinate: Coordinate2D,
    method: ResamplingMethod,
) -> Option<f64> {
    match method {
        ResamplingMethod::Nearest => {
            let (y, x) = source_geo_transform.coordinate_2d_to_grid_2d(coordinate);
            source.sample_f64(y, x)
        }
        ResamplingMethod::Bilinear => sample_bilinear(source, source_geo_transform, coordinate),
    }
}

fn sample_bilinear(
    source: &TypedGrid,
    source_geo_transform: GeoTransform,
    coordinate: Coordinate2D,
) -> Option<f64> {
    // fractional pixel position relative to pixel centres
    let fx = (coordinate.x - source_geo_transform.origin_coordinate.x)
        / source_geo_transform.x_pixel_size
        - 0.5;
    let fy = (coordinate.y - source_geo_transform.origin_coordinate.y)
        / source_geo_transform.y_pixel_size
        - 0.5;

    let x0 = fx.floor();
    let y0 = fy.floor();
    let wx = fx - x0;
    let wy = fy - y0;

    let samples = [
        source.sample_f64(y0 as isize, x0 as isize),
        source.sample_f64(y0 as isize, x0 as isize + 1),
        source.sample_f64(y0 as isize + 1, x0 as isize),
        source.sample_f64(y0 as isize + 1, x0 as isize + 1),
    ];

    match samples {
        [Some(v00), Some(v01), Some(v10), Some(v11)] => {
            let top = v00 * (1. - wx) + v01 * wx;
            let bottom = v10 * (1. - wx) + v11 * wx;
            Some(top * (1. - wy) + bottom * wy)
        }
        // nodata or the source edge in the support: degrade to nearest
        _ => {
            let (y, x) = source_geo_transform.coordinate_2d_to_grid_2d(coordinate);
            source.sample_f64(y, x)
        }
    }
}

/// Copies every non-nodata cell of `source` over `target`. Both grids must
/// have the same shape and datatype; used to fuse aligned tiles.
pub fn overlay_aligned(target: &mut TypedGrid, source: &TypedGrid) -> Result<usize> {
    snafu::ensure!(
        target.data_type() == source.data_type(),
        error::Query {
            reason: format!(
                "cannot overlay a {} grid over a {} grid",
                source.data_type(),
                target.data_type()
            )
        }
    );
    snafu::ensure!(
        target.shape() == source.shape(),
        error::Query {
            reason: format!(
                "cannot overlay grids of shapes {:?} and {:?}",
                target.shape().shape_array,
                source.shape().shape_array
            )
        }
    );

    let shape = target.shape();
    let mut written = 0;
    for y in 0..shape.axis_size_y() {
        for x in 0..shape.axis_size_x() {
            if let Some(value) = source.sample_f64(y as isize, x as isize) {
                target.set_f64(y, x, value)?;
                written += 1;
            }
        }
    }
    Ok(written)
}
