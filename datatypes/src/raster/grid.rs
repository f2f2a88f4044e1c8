use crate::error;
use crate::raster::Pixel;
use crate::Result;
use serde::{Deserialize, Serialize};
use snafu::ensure;

/// The shape of a 2D grid as `[y, x]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape2D {
    pub shape_array: [usize; 2],
}

impl GridShape2D {
    pub fn new(shape_array: [usize; 2]) -> Self {
        Self { shape_array }
    }

    pub fn axis_size_y(&self) -> usize {
        self.shape_array[0]
    }

    pub fn axis_size_x(&self) -> usize {
        self.shape_array[1]
    }

    pub fn number_of_elements(&self) -> usize {
        self.shape_array[0] * self.shape_array[1]
    }

    pub fn contains(&self, y: usize, x: usize) -> bool {
        y < self.axis_size_y() && x < self.axis_size_x()
    }

    /// Row-major linear index
    pub fn linear_index(&self, y: usize, x: usize) -> usize {
        y * self.axis_size_x() + x
    }
}

impl From<[usize; 2]> for GridShape2D {
    fn from(shape_array: [usize; 2]) -> Self {
        Self { shape_array }
    }
}

/// A dense 2D grid in row-major order with an optional no-data value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(serialize = "T: Serialize", deserialize = "T: serde::de::DeserializeOwned")
)]
pub struct Grid2D<T> {
    shape: GridShape2D,
    data: Vec<T>,
    no_data_value: Option<T>,
}

impl<T> Grid2D<T>
where
    T: Pixel,
{
    pub fn new(shape: GridShape2D, data: Vec<T>, no_data_value: Option<T>) -> Result<Self> {
        ensure!(
            shape.number_of_elements() == data.len(),
            error::GridDataLengthMismatch {
                data_len: data.len(),
                shape: shape.shape_array
            }
        );
        Ok(Self {
            shape,
            data,
            no_data_value,
        })
    }

    pub fn new_filled(shape: GridShape2D, fill_value: T, no_data_value: Option<T>) -> Self {
        Self {
            shape,
            data: vec![fill_value; shape.number_of_elements()],
            no_data_value,
        }
    }

    pub fn shape(&self) -> GridShape2D {
        self.shape
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn no_data_value(&self) -> Option<T> {
        self.no_data_value
    }

    pub fn is_no_data(&self, value: T) -> bool {
        match self.no_data_value {
            Some(no_data) => value == no_data || (!is_not_nan(no_data) && !is_not_nan(value)),
            None => false,
        }
    }

    pub fn value_at_grid_index(&self, y: usize, x: usize) -> Result<T> {
        ensure!(
            self.shape.contains(y, x),
            error::GridIndexOutOfBounds {
                y,
                x,
                shape: self.shape.shape_array
            }
        );
        Ok(self.data[self.shape.linear_index(y, x)])
    }

    pub fn set_at_grid_index(&mut self, y: usize, x: usize, value: T) -> Result<()> {
        ensure!(
            self.shape.contains(y, x),
            error::GridIndexOutOfBounds {
                y,
                x,
                shape: self.shape.shape_array
            }
        );
        let index = self.shape.linear_index(y, x);
        self.data[index] = value;
        Ok(())
    }

    /// Converts the element type, mapping the no-data value alongside
    pub fn convert<To>(self) -> Grid2D<To>
    where
        To: Pixel,
        T: num_traits::AsPrimitive<To>,
    {
        Grid2D {
            shape: self.shape,
            data: self.data.iter().map(|&v| v.as_()).collect(),
            no_data_value: self.no_data_value.map(|v| v.as_()),
        }
    }
}

/// NaN-aware comparison support: NaN no-data compares equal to NaN values
fn is_not_nan<T: Pixel>(value: T) -> bool {
    let as_f64: f64 = value.as_();
    !as_f64.is_nan()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checks_length() {
        assert!(Grid2D::<u8>::new([2, 2].into(), vec![1, 2, 3], None).is_err());
        assert!(Grid2D::<u8>::new([2, 2].into(), vec![1, 2, 3, 4], None).is_ok());
    }

    #[test]
    fn indexing() {
        let mut grid = Grid2D::new([2, 3].into(), vec![1_u8, 2, 3, 4, 5, 6], Some(0)).unwrap();
        assert_eq!(grid.value_at_grid_index(0, 2).unwrap(), 3);
        assert_eq!(grid.value_at_grid_index(1, 0).unwrap(), 4);
        assert!(grid.value_at_grid_index(2, 0).is_err());

        grid.set_at_grid_index(1, 1, 9).unwrap();
        assert_eq!(grid.value_at_grid_index(1, 1).unwrap(), 9);
    }

    #[test]
    fn no_data_handles_nan() {
        let grid = Grid2D::new([1, 2].into(), vec![f64::NAN, 1.], Some(f64::NAN)).unwrap();
        assert!(grid.is_no_data(f64::NAN));
        assert!(!grid.is_no_data(1.));
    }
}
