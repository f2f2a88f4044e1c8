use crate::error;
use crate::Result;
use serde::{Deserialize, Serialize};
use snafu::ensure;

/// The size of a pixel in coordinate units, always positive in both axes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialResolution {
    pub x: f64,
    pub y: f64,
}

impl SpatialResolution {
    pub fn new(x: f64, y: f64) -> Result<Self> {
        ensure!(
            x > 0. && y > 0.,
            error::InvalidSpatialResolution { x, y }
        );
        Ok(Self { x, y })
    }

    pub fn new_unchecked(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero_point_one() -> Self {
        Self { x: 0.1, y: 0.1 }
    }

    pub fn one() -> Self {
        Self { x: 1., y: 1. }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_sizes() {
        assert!(SpatialResolution::new(0., 1.).is_err());
        assert!(SpatialResolution::new(1., -1.).is_err());
        assert!(SpatialResolution::new(0.25, 0.25).is_ok());
    }
}
