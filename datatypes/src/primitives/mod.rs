mod bounding_box;
mod coordinate;
mod spatial_resolution;
mod time_instance;
mod time_interval;

pub use bounding_box::BoundingBox2D;
pub use coordinate::Coordinate2D;
pub use spatial_resolution::SpatialResolution;
pub use time_instance::TimeInstance;
pub use time_interval::TimeInterval;

/// Marks types with a spatial extent
pub trait SpatialBounded {
    fn spatial_bounds(&self) -> BoundingBox2D;
}

/// Marks types with a temporal extent
pub trait TemporalBounded {
    fn temporal_bounds(&self) -> TimeInterval;
}
