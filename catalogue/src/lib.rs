pub mod descriptor;
pub mod error;
pub mod provenance;
pub mod query;
pub mod schema;
pub mod store;
pub mod util;

pub use error::Error;

/// Result type of the catalogue crate
pub type Result<T, E = Error> = std::result::Result<T, E>;
