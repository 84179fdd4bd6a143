//! Gridded-data containers
//!
//! The kernel never touches files. Drivers read the model fields from a
//! container through [`FieldSource`], run the kernel, and write the results
//! through [`FieldSink`]. Two backends exist:
//!
//! - JSON (`.json`), always available
//! - netCDF (`.nc`), behind the `netcdf` cargo feature
//!
//! The backend is picked from the file extension by [`open_source`] and
//! [`create_sink`].

mod error;
mod fields;
mod json;
#[cfg(feature = "netcdf")]
mod nc;

pub use error::IoError;
pub use fields::{
    read_coordinates, read_fields, surface_variable, variable_name, write_fields,
    CoordinateVariable, Coordinates, InputFields, BASE_VARIABLE, CELL_DIMENSION,
    LEVEL_DIMENSION, SURFACE_DIMENSION,
};
pub use json::{JsonContainer, JsonSink, JsonVariable};

use crate::core_types::Real;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use tracing::info;

/// String attributes of a variable, sorted by name
pub type Attributes = BTreeMap<String, String>;

/// Named extent of a container axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Axis name
    pub name: String,
    /// Number of entries
    pub len: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }
}

/// Read access to a gridded-data container
pub trait FieldSource {
    /// Axes of `variable`, slowest-varying first
    fn dimensions(&self, variable: &str) -> Result<Vec<Dimension>, IoError>;

    /// Every value of a variable without a time axis, row-major
    fn read(&self, variable: &str) -> Result<Vec<Real>, IoError>;

    /// One step of a variable whose first axis is time, row-major
    fn read_time_step(&self, variable: &str, time_index: usize) -> Result<Vec<Real>, IoError>;

    /// String attributes of `variable`
    fn attributes(&self, variable: &str) -> Result<Attributes, IoError>;
}

/// Write access to a gridded-data container
pub trait FieldSink {
    /// Declare an axis; declaring an existing axis with the same length is a no-op
    fn define_dimension(&mut self, name: &str, len: usize) -> Result<(), IoError>;

    /// Store a row-major variable over previously declared axes
    fn write(
        &mut self,
        variable: &str,
        dimensions: &[&str],
        data: &[Real],
        attributes: &Attributes,
    ) -> Result<(), IoError>;

    /// Flush everything written so far to the backing file
    fn finish(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}

/// Container format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    NetCdf,
}

impl Format {
    /// Format of `path`, from its extension
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
            Some(ext) if ext.eq_ignore_ascii_case("nc") || ext.eq_ignore_ascii_case("nc4") => {
                Ok(Format::NetCdf)
            }
            _ => Err(IoError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Open an existing container for reading
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn FieldSource>, IoError> {
    let path = path.as_ref();
    let source: Box<dyn FieldSource> = match Format::from_path(path)? {
        Format::Json => Box::new(JsonContainer::open(path)?),
        #[cfg(feature = "netcdf")]
        Format::NetCdf => Box::new(nc::NetCdfSource::open(path)?),
        #[cfg(not(feature = "netcdf"))]
        Format::NetCdf => return Err(IoError::NetCdfUnavailable(path.to_path_buf())),
    };
    info!("Opened input container {}", path.display());
    Ok(source)
}

/// Create (or replace) a container for writing
pub fn create_sink(path: impl AsRef<Path>) -> Result<Box<dyn FieldSink>, IoError> {
    let path = path.as_ref();
    let sink: Box<dyn FieldSink> = match Format::from_path(path)? {
        Format::Json => Box::new(JsonSink::create(path)),
        #[cfg(feature = "netcdf")]
        Format::NetCdf => Box::new(nc::NetCdfSink::create(path)?),
        #[cfg(not(feature = "netcdf"))]
        Format::NetCdf => return Err(IoError::NetCdfUnavailable(path.to_path_buf())),
    };
    info!("Created output container {}", path.display());
    Ok(sink)
}

/// Flat range of one time step in a variable shaped `[time, ...]`
pub(crate) fn time_step_range(
    variable: &str,
    dimensions: &[Dimension],
    time_index: usize,
) -> Result<Range<usize>, IoError> {
    let Some((time, rest)) = dimensions.split_first() else {
        return Err(IoError::Malformed(format!(
            "variable '{variable}' has no time axis"
        )));
    };
    if time_index >= time.len {
        return Err(IoError::TimeIndex {
            variable: variable.to_string(),
            index: time_index,
            steps: time.len,
        });
    }
    let step: usize = rest.iter().map(|d| d.len).product();
    Ok(time_index * step..(time_index + 1) * step)
}
