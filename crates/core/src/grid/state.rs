//! Thermodynamic state and precipitation outputs of the column grid

use super::{Field2D, GridError, GridShape};
use crate::core_types::{PrecipArray, Real, Species, SpeciesArray};
use std::ops::Range;

/// Per-cell atmospheric state advanced by the kernel
///
/// Temperature and the six species are updated in place; density, pressure
/// and layer thickness are read-only inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphericState {
    /// Temperature (K)
    pub temperature: Field2D,
    /// Air density (kg/m³)
    pub density: Field2D,
    /// Pressure (Pa)
    pub pressure: Field2D,
    /// Layer thickness (m)
    pub thickness: Field2D,
    /// Mass fractions (kg/kg), one field per species
    pub q: SpeciesArray<Field2D>,
}

/// Local state of one cell, as seen by the rate laws
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    /// Temperature (K)
    pub t: Real,
    /// Air density (kg/m³)
    pub rho: Real,
    /// Pressure (Pa)
    pub p: Real,
    /// Mass fractions (kg/kg)
    pub q: SpeciesArray<Real>,
}

impl AtmosphericState {
    /// Create a state with zero species, unit density and thickness, and the
    /// given uniform temperature and pressure
    #[must_use]
    pub fn uniform(shape: GridShape, temperature: Real, pressure: Real) -> Self {
        Self {
            temperature: Field2D::with_value(shape, temperature),
            density: Field2D::with_value(shape, 1.0),
            pressure: Field2D::with_value(shape, pressure),
            thickness: Field2D::with_value(shape, 1.0),
            q: SpeciesArray::from_fn(|_| Field2D::new(shape)),
        }
    }

    /// Shape shared by every field
    #[inline]
    #[must_use]
    pub fn shape(&self) -> GridShape {
        self.temperature.shape()
    }

    /// Check that every field has the same shape
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] naming the first disagreeing field
    pub fn validate(&self) -> Result<(), GridError> {
        let expected = self.shape();
        let named = [
            ("density", &self.density),
            ("pressure", &self.pressure),
            ("thickness", &self.thickness),
        ];
        let species = self.q.iter().map(|(s, f)| (s.short_name(), f));
        for (name, field) in named.into_iter().chain(species) {
            if field.shape() != expected {
                return Err(GridError::ShapeMismatch {
                    field: name.to_string(),
                    expected,
                    actual: field.shape(),
                });
            }
        }
        Ok(())
    }

    /// Check a column range against the grid
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ColumnRange`] for an empty or out-of-bounds range
    pub fn check_columns(&self, columns: &Range<usize>) -> Result<(), GridError> {
        let total = self.shape().columns;
        if columns.start >= columns.end || columns.end > total {
            return Err(GridError::ColumnRange {
                start: columns.start,
                end: columns.end,
                columns: total,
            });
        }
        Ok(())
    }

    /// Mass fractions of all species at flat index `idx`
    #[inline]
    #[must_use]
    pub fn species_at(&self, idx: usize) -> SpeciesArray<Real> {
        SpeciesArray::from_fn(|s| self.q[s].as_slice()[idx])
    }

    /// Gather the local state of `(level, column)`
    #[must_use]
    pub fn cell(&self, level: usize, column: usize) -> CellState {
        let idx = self.shape().index(level, column);
        assert!(idx < self.shape().cells(), "Coordinates out of bounds");
        CellState {
            t: self.temperature.as_slice()[idx],
            rho: self.density.as_slice()[idx],
            p: self.pressure.as_slice()[idx],
            q: self.species_at(idx),
        }
    }

    /// Mass fraction field of one species
    #[inline]
    #[must_use]
    pub fn species(&self, species: Species) -> &Field2D {
        &self.q[species]
    }

    /// Mutable mass fraction field of one species
    #[inline]
    pub fn species_mut(&mut self, species: Species) -> &mut Field2D {
        &mut self.q[species]
    }
}

/// Precipitation diagnostics written by the sedimentation sweep
///
/// The surface rates double as the flux entering the first swept level of
/// the next call: they are caller-owned and persist between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecipitationOutput {
    /// Combined precipitation flux profile (kg/m²/s), rain plus frozen species
    pub pflx: Field2D,
    /// Surface rate per precipitating species (`prr_gsp`, `pri_gsp`, `prs_gsp`, `prg_gsp`)
    pub surface: PrecipArray<Vec<Real>>,
    /// Surface energy flux term (`pre_gsp`)
    pub energy: Vec<Real>,
}

impl PrecipitationOutput {
    /// Zeroed outputs for a grid
    #[must_use]
    pub fn new(shape: GridShape) -> Self {
        Self {
            pflx: Field2D::new(shape),
            surface: PrecipArray::from_fn(|_| vec![0.0; shape.columns]),
            energy: vec![0.0; shape.columns],
        }
    }

    /// Check buffer sizes against a grid shape
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] for the first buffer of the wrong size
    pub fn validate(&self, shape: GridShape) -> Result<(), GridError> {
        if self.pflx.shape() != shape {
            return Err(GridError::ShapeMismatch {
                field: "pflx".to_string(),
                expected: shape,
                actual: self.pflx.shape(),
            });
        }
        for rates in self.surface.0.iter().chain(std::iter::once(&self.energy)) {
            if rates.len() != shape.columns {
                return Err(GridError::LengthMismatch {
                    expected: shape.columns,
                    actual: rates.len(),
                });
            }
        }
        Ok(())
    }

    /// Total surface precipitation rate of one column (rain + ice + snow + graupel)
    #[must_use]
    pub fn total_surface_rate(&self, column: usize) -> Real {
        self.surface.0.iter().map(|rates| rates[column]).sum()
    }
}
