//! Level-by-column field storage
//!
//! Every per-cell quantity of the column grid is stored as a flat `Vec<Real>`
//! in row-major order: `level * columns + column`.

use super::GridError;
use crate::core_types::Real;
use serde::{Deserialize, Serialize};

/// Shape of the column grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of vertical levels (`ke`)
    pub levels: usize,
    /// Number of columns (`nvec`)
    pub columns: usize,
}

impl GridShape {
    /// Create a shape
    #[must_use]
    pub const fn new(levels: usize, columns: usize) -> Self {
        Self { levels, columns }
    }

    /// Total number of cells
    #[inline]
    #[must_use]
    pub const fn cells(&self) -> usize {
        self.levels * self.columns
    }

    /// Flat index of `(level, column)`
    #[inline]
    #[must_use]
    pub const fn index(&self, level: usize, column: usize) -> usize {
        level * self.columns + column
    }
}

/// 2D field over `(level, column)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field2D {
    data: Vec<Real>,
    shape: GridShape,
}

impl Field2D {
    /// Create a field initialized to zero
    #[must_use]
    pub fn new(shape: GridShape) -> Self {
        Self::with_value(shape, 0.0)
    }

    /// Create a field with every cell set to `value`
    #[must_use]
    pub fn with_value(shape: GridShape, value: Real) -> Self {
        Self {
            data: vec![value; shape.cells()],
            shape,
        }
    }

    /// Wrap an existing row-major buffer
    ///
    /// # Errors
    ///
    /// Returns [`GridError::LengthMismatch`] if `data.len()` is not `levels * columns`
    pub fn from_vec(shape: GridShape, data: Vec<Real>) -> Result<Self, GridError> {
        if data.len() != shape.cells() {
            return Err(GridError::LengthMismatch {
                expected: shape.cells(),
                actual: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    /// Grid shape
    #[inline]
    #[must_use]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Borrow the raw buffer
    #[must_use]
    pub fn as_slice(&self) -> &[Real] {
        &self.data
    }

    /// Mutably borrow the raw buffer
    pub fn as_mut_slice(&mut self) -> &mut [Real] {
        &mut self.data
    }

    /// Consume the field and return the buffer
    #[must_use]
    pub fn into_vec(self) -> Vec<Real> {
        self.data
    }

    /// Value at `(level, column)`
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds
    #[inline]
    #[must_use]
    pub fn get(&self, level: usize, column: usize) -> Real {
        assert!(
            level < self.shape.levels && column < self.shape.columns,
            "Coordinates out of bounds"
        );
        self.data[self.shape.index(level, column)]
    }

    /// Set the value at `(level, column)`
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds
    #[inline]
    pub fn set(&mut self, level: usize, column: usize, value: Real) {
        assert!(
            level < self.shape.levels && column < self.shape.columns,
            "Coordinates out of bounds"
        );
        let idx = self.shape.index(level, column);
        self.data[idx] = value;
    }

    /// Copy one column out, top level first
    #[must_use]
    pub fn column(&self, column: usize) -> Vec<Real> {
        assert!(column < self.shape.columns, "Coordinates out of bounds");
        (0..self.shape.levels)
            .map(|level| self.data[self.shape.index(level, column)])
            .collect()
    }

    /// Overwrite one column, top level first
    pub fn set_column(&mut self, column: usize, values: &[Real]) {
        assert!(column < self.shape.columns, "Coordinates out of bounds");
        assert_eq!(values.len(), self.shape.levels, "Column length mismatch");
        for (level, &value) in values.iter().enumerate() {
            let idx = self.shape.index(level, column);
            self.data[idx] = value;
        }
    }

    /// Fill the entire field with a value
    pub fn fill(&mut self, value: Real) {
        self.data.fill(value);
    }
}
