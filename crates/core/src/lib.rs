//! Graupel Microphysics Core Library
//!
//! A single-moment bulk cloud microphysics scheme with six water species
//! (vapor, cloud water, rain, cloud ice, snow, graupel) on a column grid,
//! followed by a semi-implicit sedimentation sweep of the four precipitating
//! species.
//!
//! ## Layout
//!
//! - [`core_types`]: precision, species identifiers, per-species containers
//! - [`grid`]: level-by-column fields, kernel state and precipitation outputs
//! - [`physics`]: constants, thermodynamics and the rate-law library
//! - [`solver`]: the kernel (filter, transfer network, sedimentation)
//! - [`io`]: gridded-data containers (JSON, optionally netCDF)

// Core types and utilities
pub mod core_types;

// Column grid data model
pub mod grid;

// Rate laws and thermodynamics
pub mod physics;

// Microphysics kernel
pub mod solver;

// Container I/O
pub mod io;

// Re-export core types
pub use core_types::{PrecipArray, Real, Species, SpeciesArray};

// Re-export grid types
pub use grid::{
    layer_thickness, AtmosphericState, CellState, Field2D, GridError, GridShape,
    PrecipitationOutput,
};

// Re-export the kernel entry points
pub use solver::{graupel, graupel_all, FilterThresholds, KernelParams, KernelStats};
