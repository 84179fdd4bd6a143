//! Physical constants of moist thermodynamics and the graupel scheme

use crate::core_types::Real;

// ============================================================================
// THERMODYNAMICS
// ============================================================================

/// Gas constant of dry air (J/(kg·K))
pub const RD: Real = 287.04;
/// Gas constant of water vapor (J/(kg·K))
pub const RV: Real = 461.51;
/// Isobaric specific heat of dry air (J/(kg·K))
pub const CPD: Real = 1004.64;
/// Isobaric specific heat of water vapor (J/(kg·K))
pub const CPV: Real = 1869.46;
/// Isochoric specific heat of dry air (J/(kg·K))
pub const CVD: Real = CPD - RD;
/// Isochoric specific heat of water vapor (J/(kg·K))
pub const CVV: Real = CPV - RV;
/// Ratio of liquid water to dry air specific heat, minus one
const RCPL: Real = 3.1733;
/// Specific heat of liquid water (J/(kg·K))
pub const CLW: Real = (RCPL + 1.0) * CPD;
/// Specific heat of ice (J/(kg·K))
pub const CI: Real = 2108.0;
/// Melting temperature of ice (K)
pub const TMELT: Real = 273.15;
/// Latent heat of vaporization at the melting point (J/kg)
pub const ALV: Real = 2.5008e6;
/// Latent heat of sublimation at the melting point (J/kg)
pub const ALS: Real = 2.8345e6;
/// Temperature-invariant part of the vaporization enthalpy (J/kg)
pub const LVC: Real = ALV - (CPV - CLW) * TMELT;
/// Temperature-invariant part of the sublimation enthalpy (J/kg)
pub const LSC: Real = ALS - (CPV - CI) * TMELT;

/// Magnus formula: saturation vapor pressure at the melting point (Pa)
pub const C1ES: Real = 610.78;
/// Magnus formula: liquid exponent factor
pub const C3LES: Real = 17.269;
/// Magnus formula: ice exponent factor
pub const C3IES: Real = 21.875;
/// Magnus formula: liquid temperature offset (K)
pub const C4LES: Real = 35.86;
/// Magnus formula: ice temperature offset (K)
pub const C4IES: Real = 7.66;

// ============================================================================
// GRAUPEL SCHEME
// ============================================================================

/// Mixing ratio below which a species counts as absent
pub const QMIN: Real = 1.0e-15;
/// Reference air density for terminal velocities (kg/m³)
pub const RHO_00: Real = 1.225;
/// Upper temperature bound of heterogeneous freezing of cloud water (K)
pub const TFRZ_HET1: Real = TMELT - 6.0;
/// Temperature below which ice nucleates from vapor (K)
pub const TFRZ_HET2: Real = TMELT - 25.0;
/// Homogeneous freezing temperature (K)
pub const TFRZ_HOM: Real = TMELT - 37.0;
/// Melting-rate supersaturation coupling (K)
pub const TX: Real = 3339.5;
/// Initial mass of a nucleated ice crystal (kg)
pub const M0_ICE: Real = 1.0e-12;

/// Snow mass-size prefactor
pub const AMS: Real = 0.069;
/// Snow mass-size exponent
pub const BMS: Real = 2.0;
/// Snow fall-speed prefactor
pub const V0S: Real = 25.0;
/// Snow fall-speed exponent
pub const V1S: Real = 0.5;
