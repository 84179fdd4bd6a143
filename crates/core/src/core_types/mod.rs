//! Core types shared by every module

pub mod species;

pub use species::{PrecipArray, Species, SpeciesArray, NUM_PRECIPITATING, NUM_SPECIES};

/// Floating-point type of every field, constant, and rate law
#[cfg(not(feature = "single-precision"))]
pub type Real = f64;

/// Floating-point type of every field, constant, and rate law
#[cfg(feature = "single-precision")]
pub type Real = f32;
