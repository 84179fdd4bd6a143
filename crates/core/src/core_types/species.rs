//! Water substance categories of the graupel scheme
//!
//! The scheme carries six mass fractions per cell. Four of them (rain, ice,
//! snow, graupel) fall under gravity and take part in sedimentation.
//!
//! Per-species storage is expressed through two fixed-size containers:
//! - [`SpeciesArray`]: one value per species, indexed by [`Species`]
//! - [`PrecipArray`]: one value per precipitating species, indexed by [`Species`]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Number of water substance categories
pub const NUM_SPECIES: usize = 6;

/// Number of precipitating categories
pub const NUM_PRECIPITATING: usize = 4;

/// Water substance category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    /// Water vapor
    Vapor,
    /// Cloud water (suspended liquid droplets)
    Cloud,
    /// Rain
    Rain,
    /// Cloud ice (small crystals)
    Ice,
    /// Snow (aggregates)
    Snow,
    /// Graupel (rimed ice)
    Graupel,
}

impl Species {
    /// Every species, in storage order
    pub const ALL: [Species; NUM_SPECIES] = [
        Species::Vapor,
        Species::Cloud,
        Species::Rain,
        Species::Ice,
        Species::Snow,
        Species::Graupel,
    ];

    /// Species that sediment, in sweep order
    pub const PRECIPITATING: [Species; NUM_PRECIPITATING] =
        [Species::Rain, Species::Ice, Species::Snow, Species::Graupel];

    /// Frozen species (ice, snow, graupel)
    pub const FROZEN: [Species; 3] = [Species::Ice, Species::Snow, Species::Graupel];

    /// Position in [`Species::ALL`]
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Position in [`Species::PRECIPITATING`], or `None` for vapor and cloud
    #[inline]
    #[must_use]
    pub const fn precip_index(self) -> Option<usize> {
        match self {
            Species::Rain => Some(0),
            Species::Ice => Some(1),
            Species::Snow => Some(2),
            Species::Graupel => Some(3),
            Species::Vapor | Species::Cloud => None,
        }
    }

    /// Whether the species sediments
    #[inline]
    #[must_use]
    pub const fn is_precipitating(self) -> bool {
        self.precip_index().is_some()
    }

    /// Whether the species is in the ice phase
    #[inline]
    #[must_use]
    pub const fn is_frozen(self) -> bool {
        matches!(self, Species::Ice | Species::Snow | Species::Graupel)
    }

    /// Short conventional name (`qv`, `qc`, ...)
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Species::Vapor => "qv",
            Species::Cloud => "qc",
            Species::Rain => "qr",
            Species::Ice => "qi",
            Species::Snow => "qs",
            Species::Graupel => "qg",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// One value per species
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeciesArray<T>(pub [T; NUM_SPECIES]);

impl<T> SpeciesArray<T> {
    /// Build by evaluating `f` for every species
    pub fn from_fn(mut f: impl FnMut(Species) -> T) -> Self {
        Self(Species::ALL.map(&mut f))
    }

    /// Iterate `(species, value)` pairs in storage order
    pub fn iter(&self) -> impl Iterator<Item = (Species, &T)> {
        Species::ALL.into_iter().zip(self.0.iter())
    }

    /// Apply `f` to every value
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SpeciesArray<U> {
        SpeciesArray(self.0.map(f))
    }
}

impl<T> Index<Species> for SpeciesArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, species: Species) -> &T {
        &self.0[species.index()]
    }
}

impl<T> IndexMut<Species> for SpeciesArray<T> {
    #[inline]
    fn index_mut(&mut self, species: Species) -> &mut T {
        &mut self.0[species.index()]
    }
}

/// One value per precipitating species
///
/// Indexing with vapor or cloud panics: those species never sediment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PrecipArray<T>(pub [T; NUM_PRECIPITATING]);

impl<T> PrecipArray<T> {
    /// Build by evaluating `f` for every precipitating species
    pub fn from_fn(mut f: impl FnMut(Species) -> T) -> Self {
        Self(Species::PRECIPITATING.map(&mut f))
    }

    /// Iterate `(species, value)` pairs in sweep order
    pub fn iter(&self) -> impl Iterator<Item = (Species, &T)> {
        Species::PRECIPITATING.into_iter().zip(self.0.iter())
    }
}

#[inline]
fn precip_slot(species: Species) -> usize {
    match species.precip_index() {
        Some(slot) => slot,
        None => panic!("{species} is not a precipitating species"),
    }
}

impl<T> Index<Species> for PrecipArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, species: Species) -> &T {
        &self.0[precip_slot(species)]
    }
}

impl<T> IndexMut<Species> for PrecipArray<T> {
    #[inline]
    fn index_mut(&mut self, species: Species) -> &mut T {
        &mut self.0[precip_slot(species)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groupings_are_consistent() {
        for (i, species) in Species::ALL.iter().enumerate() {
            assert_eq!(species.index(), i);
        }
        for (i, species) in Species::PRECIPITATING.iter().enumerate() {
            assert_eq!(species.precip_index(), Some(i));
            assert!(species.is_precipitating());
        }
        assert!(!Species::Vapor.is_precipitating());
        assert!(!Species::Cloud.is_precipitating());
        assert!(Species::FROZEN.iter().all(|s| s.is_frozen()));
    }

    #[test]
    fn test_species_array_indexing() {
        let mut values = SpeciesArray::from_fn(|s| s.index() * 10);
        assert_eq!(values[Species::Snow], 40);
        values[Species::Snow] = 7;
        assert_eq!(values.0[4], 7);
        let names: Vec<_> = values.iter().map(|(s, _)| s.short_name()).collect();
        assert_eq!(names, ["qv", "qc", "qr", "qi", "qs", "qg"]);
    }

    #[test]
    fn test_precip_array_indexing() {
        let mut flux = PrecipArray::from_fn(|s| s.index());
        assert_eq!(flux[Species::Rain], 2);
        assert_eq!(flux[Species::Graupel], 5);
        flux[Species::Ice] = 11;
        assert_eq!(flux.0[1], 11);
    }

    #[test]
    #[should_panic(expected = "qv is not a precipitating species")]
    fn test_precip_array_rejects_vapor() {
        let flux = PrecipArray([0.0_f64; NUM_PRECIPITATING]);
        let _ = flux[Species::Vapor];
    }
}
