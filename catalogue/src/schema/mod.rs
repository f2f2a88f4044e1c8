mod dataset;
mod dimension;
mod measurement;
mod storage_type;
mod storage_unit;
pub mod test_support;

pub use dataset::{DatasetDimension, DatasetRecord, DatasetType, ObservationRecord};
pub use dimension::{Dimension, DimensionProperties, Domain, ReferenceSystem};
pub use measurement::{MeasurementType, ResamplingMethod};
pub use storage_type::{StorageType, StorageTypeDimension};
pub use storage_unit::{
    StorageUnitDimension, StorageUnitRecord, StorageUnitStatus, TileIndex,
};
