//! Errors of the gridded-data containers

use crate::grid::GridError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading or writing a gridded-data container
///
/// Every variant is fatal for a driver run; there is no partial result.
#[derive(Debug, Error)]
pub enum IoError {
    /// The container has no variable of this name
    #[error("variable '{0}' not found")]
    MissingVariable(String),

    /// A variable refers to a dimension the container does not define
    #[error("dimension '{0}' not found")]
    MissingDimension(String),

    /// A variable's extents disagree with the grid
    #[error("variable '{variable}' has extents {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        variable: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The requested time step is past the end of the time axis
    #[error("time index {index} is out of range for '{variable}' with {steps} steps")]
    TimeIndex {
        variable: String,
        index: usize,
        steps: usize,
    },

    /// The container content is structurally invalid
    #[error("malformed container: {0}")]
    Malformed(String),

    /// No backend handles this file extension
    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The file needs the netCDF backend, which was not compiled in
    #[error("{} is a netCDF file; rebuild with the `netcdf` feature", .0.display())]
    NetCdfUnavailable(PathBuf),

    /// Assembled fields do not form a valid grid
    #[error(transparent)]
    Grid(#[from] GridError),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The netCDF library reported an error
    #[cfg(feature = "netcdf")]
    #[error("netCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// Filesystem failure
    #[error("failed to access {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
