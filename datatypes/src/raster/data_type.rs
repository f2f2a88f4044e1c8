use crate::error;
use crate::Result;
use num_traits::AsPrimitive;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The datatype of a raster band
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
    EnumIter,
    IntoStaticStr,
)]
pub enum RasterDataType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl RasterDataType {
    pub fn byte_size(self) -> usize {
        match self {
            RasterDataType::U8 | RasterDataType::I8 => 1,
            RasterDataType::U16 | RasterDataType::I16 => 2,
            RasterDataType::U32 | RasterDataType::I32 | RasterDataType::F32 => 4,
            RasterDataType::U64 | RasterDataType::I64 | RasterDataType::F64 => 8,
        }
    }

    /// Whether `value` is exactly representable in this datatype
    pub fn can_represent(self, value: f64) -> bool {
        fn fits<T>(value: f64) -> bool
        where
            T: Pixel,
        {
            let cast = T::from_f64_lossy(value);
            let back: f64 = cast.as_();
            back == value
        }

        match self {
            RasterDataType::U8 => fits::<u8>(value),
            RasterDataType::U16 => fits::<u16>(value),
            RasterDataType::U32 => fits::<u32>(value),
            RasterDataType::U64 => fits::<u64>(value),
            RasterDataType::I8 => fits::<i8>(value),
            RasterDataType::I16 => fits::<i16>(value),
            RasterDataType::I32 => fits::<i32>(value),
            RasterDataType::I64 => fits::<i64>(value),
            RasterDataType::F32 => value.is_nan() || fits::<f32>(value),
            RasterDataType::F64 => true,
        }
    }
}

/// A raster value tagged with its datatype
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TypedRasterValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl TypedRasterValue {
    pub fn from_f64(data_type: RasterDataType, value: f64) -> Result<Self> {
        snafu::ensure!(
            data_type.can_represent(value),
            error::UnrepresentableRasterValue {
                value,
                data_type: data_type.to_string()
            }
        );
        Ok(Self::from_f64_lossy(data_type, value))
    }

    pub fn from_f64_lossy(data_type: RasterDataType, value: f64) -> Self {
        match data_type {
            RasterDataType::U8 => Self::U8(u8::from_f64_lossy(value)),
            RasterDataType::U16 => Self::U16(u16::from_f64_lossy(value)),
            RasterDataType::U32 => Self::U32(u32::from_f64_lossy(value)),
            RasterDataType::U64 => Self::U64(u64::from_f64_lossy(value)),
            RasterDataType::I8 => Self::I8(i8::from_f64_lossy(value)),
            RasterDataType::I16 => Self::I16(i16::from_f64_lossy(value)),
            RasterDataType::I32 => Self::I32(i32::from_f64_lossy(value)),
            RasterDataType::I64 => Self::I64(i64::from_f64_lossy(value)),
            RasterDataType::F32 => Self::F32(f32::from_f64_lossy(value)),
            RasterDataType::F64 => Self::F64(value),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::U8(v) => v.as_(),
            Self::U16(v) => v.as_(),
            Self::U32(v) => v.as_(),
            Self::U64(v) => v.as_(),
            Self::I8(v) => v.as_(),
            Self::I16(v) => v.as_(),
            Self::I32(v) => v.as_(),
            Self::I64(v) => v.as_(),
            Self::F32(v) => v.as_(),
            Self::F64(v) => v,
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
}

/// Conversion from another primitive, truncating like an `as` cast
pub trait FromPrimitive<T> {
    fn from_primitive(value: T) -> Self;
}

impl<T, F> FromPrimitive<F> for T
where
    F: AsPrimitive<T>,
    T: Copy + 'static,
{
    fn from_primitive(value: F) -> Self {
        value.as_()
    }
}

/// The trait all raster element types implement
pub trait Pixel:
    'static
    + Copy
    + Debug
    + Default
    + Send
    + Sync
    + PartialEq
    + PartialOrd
    + Serialize
    + DeserializeOwned
    + AsPrimitive<f64>
{
    const DATA_TYPE: RasterDataType;

    /// Casts an `f64` into the pixel type, truncating like `as`
    fn from_f64_lossy(value: f64) -> Self;
}

macro_rules! impl_pixel {
    ($t:ty, $variant:ident) => {
        impl Pixel for $t {
            const DATA_TYPE: RasterDataType = RasterDataType::$variant;

            fn from_f64_lossy(value: f64) -> Self {
                value as $t
            }
        }
    };
}

impl_pixel!(u8, U8);
impl_pixel!(u16, U16);
impl_pixel!(u32, U32);
impl_pixel!(u64, U64);
impl_pixel!(i8, I8);
impl_pixel!(i16, I16);
impl_pixel!(i32, I32);
impl_pixel!(i64, I64);
impl_pixel!(f32, F32);
impl_pixel!(f64, F64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representability() {
        assert!(RasterDataType::U8.can_represent(255.));
        assert!(!RasterDataType::U8.can_represent(256.));
        assert!(!RasterDataType::U8.can_represent(-1.));
        assert!(RasterDataType::I16.can_represent(-999.));
        assert!(!RasterDataType::I16.can_represent(0.5));
        assert!(RasterDataType::F32.can_represent(0.5));
    }

    #[test]
    fn typed_value_round_trip() {
        let v = TypedRasterValue::from_f64(RasterDataType::I16, -999.).unwrap();
        assert_eq!(v, TypedRasterValue::I16(-999));
        assert_eq!(v.as_f64(), -999.);
        assert!(TypedRasterValue::from_f64(RasterDataType::U8, 300.).is_err());
    }
}
