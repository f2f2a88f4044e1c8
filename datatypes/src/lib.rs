pub mod dataset;
pub mod error;
pub mod indexing;
pub mod operations;
pub mod primitives;
pub mod raster;
pub mod spatial_reference;
pub mod util;

pub use error::Error;

/// Result type of the datatypes crate
pub type Result<T, E = Error> = std::result::Result<T, E>;
