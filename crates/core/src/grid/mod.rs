//! Column grid data model
//!
//! The grid is a logical 2D array of `levels × columns` cells. Level 0 is the
//! top of the column; the vertical sedimentation sweep runs towards higher
//! level indices. All buffers are owned by the caller and mutated in place.

mod field;
mod geometry;
mod state;

pub use field::{Field2D, GridShape};
pub use geometry::layer_thickness;
pub use state::{AtmosphericState, CellState, PrecipitationOutput};

use thiserror::Error;

/// Errors raised when assembling grid buffers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// A flat buffer does not hold `levels * columns` values
    #[error("field buffer holds {actual} values, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A named field has a different shape from the rest of the state
    #[error("field '{field}' has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        field: String,
        expected: GridShape,
        actual: GridShape,
    },

    /// The requested column range is empty or exceeds the grid
    #[error("column range {start}..{end} is invalid for {columns} columns")]
    ColumnRange {
        start: usize,
        end: usize,
        columns: usize,
    },

    /// Layer thickness needs at least two levels to extrapolate half levels
    #[error("at least two levels are required, got {levels}")]
    TooFewLevels { levels: usize },
}
