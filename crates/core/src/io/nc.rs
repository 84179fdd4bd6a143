//! netCDF container backend

use super::{time_step_range, Attributes, Dimension, FieldSink, FieldSource, IoError};
use crate::core_types::Real;
use std::path::Path;
use tracing::debug;

/// Read-only netCDF file
pub struct NetCdfSource {
    file: netcdf::File,
}

impl NetCdfSource {
    /// Open an existing netCDF file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::File {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        let file = netcdf::open(path)?;
        Ok(Self { file })
    }

    fn variable(&self, name: &str) -> Result<netcdf::Variable<'_>, IoError> {
        self.file
            .variable(name)
            .ok_or_else(|| IoError::MissingVariable(name.to_string()))
    }
}

impl FieldSource for NetCdfSource {
    fn dimensions(&self, variable: &str) -> Result<Vec<Dimension>, IoError> {
        Ok(self
            .variable(variable)?
            .dimensions()
            .iter()
            .map(|d| Dimension::new(d.name(), d.len()))
            .collect())
    }

    fn read(&self, variable: &str) -> Result<Vec<Real>, IoError> {
        let values = self.variable(variable)?.get_values::<Real, _>(..)?;
        debug!(variable, values = values.len(), "read netCDF variable");
        Ok(values)
    }

    fn read_time_step(&self, variable: &str, time_index: usize) -> Result<Vec<Real>, IoError> {
        let dimensions = self.dimensions(variable)?;
        time_step_range(variable, &dimensions, time_index)?;

        let var = self.variable(variable)?;
        let values = match dimensions.len() {
            1 => vec![var.get_value::<Real, _>([time_index])?],
            2 => var.get_values::<Real, _>((time_index, ..))?,
            3 => var.get_values::<Real, _>((time_index, .., ..))?,
            rank => {
                return Err(IoError::Malformed(format!(
                    "variable '{variable}' has rank {rank}, expected at most 3"
                )))
            }
        };
        debug!(variable, time_index, values = values.len(), "read netCDF time step");
        Ok(values)
    }

    fn attributes(&self, variable: &str) -> Result<Attributes, IoError> {
        let var = self.variable(variable)?;
        let mut attributes = Attributes::new();
        for attribute in var.attributes() {
            if let netcdf::AttributeValue::Str(value) = attribute.value()? {
                attributes.insert(attribute.name().to_string(), value);
            }
        }
        Ok(attributes)
    }
}

/// Writable netCDF file, replaced on creation and closed on drop
pub struct NetCdfSink {
    file: netcdf::FileMut,
}

impl NetCdfSink {
    /// Create (or replace) a netCDF file
    pub fn create(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let file = netcdf::create(path.as_ref())?;
        Ok(Self { file })
    }
}

impl FieldSink for NetCdfSink {
    fn define_dimension(&mut self, name: &str, len: usize) -> Result<(), IoError> {
        let existing = self.file.dimension(name).map(|d| d.len());
        match existing {
            Some(existing) if existing == len => Ok(()),
            Some(existing) => Err(IoError::Malformed(format!(
                "dimension '{name}' already declared with length {existing}, not {len}"
            ))),
            None => {
                self.file.add_dimension(name, len)?;
                Ok(())
            }
        }
    }

    fn write(
        &mut self,
        variable: &str,
        dimensions: &[&str],
        data: &[Real],
        attributes: &Attributes,
    ) -> Result<(), IoError> {
        let mut expected = Vec::with_capacity(dimensions.len());
        for &name in dimensions {
            let dim = self
                .file
                .dimension(name)
                .ok_or_else(|| IoError::MissingDimension(name.to_string()))?;
            expected.push(dim.len());
        }
        if data.len() != expected.iter().product::<usize>() {
            return Err(IoError::ShapeMismatch {
                variable: variable.to_string(),
                expected,
                actual: vec![data.len()],
            });
        }

        let mut var = self.file.add_variable::<Real>(variable, dimensions)?;
        var.put_values(data, ..)?;
        for (name, value) in attributes {
            var.put_attribute(name, value.as_str())?;
        }
        debug!(variable, values = data.len(), "wrote netCDF variable");
        Ok(())
    }
}
