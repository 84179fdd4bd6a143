//! Saturation and internal-energy relations

use super::constants::{C1ES, C3IES, C3LES, C4IES, C4LES, CI, CLW, CVD, CVV, LSC, LVC, RV, TMELT};
use crate::core_types::Real;

/// Saturation vapor density over liquid water, as a mass fraction
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `rho` - Air density (kg/m³)
#[inline]
pub fn qsat_rho(t: Real, rho: Real) -> Real {
    (C1ES * (C3LES * (t - TMELT) / (t - C4LES)).exp()) / (rho * RV * t)
}

/// Saturation vapor density over ice, as a mass fraction
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `rho` - Air density (kg/m³)
#[inline]
pub fn qsat_ice_rho(t: Real, rho: Real) -> Real {
    (C1ES * (C3IES * (t - TMELT) / (t - C4IES)).exp()) / (rho * RV * t)
}

/// Temperature derivative of the liquid saturation density at constant density
///
/// # Arguments
/// * `qs` - Saturation mass fraction at `t`
/// * `t` - Temperature (K)
#[inline]
pub fn dqsatdt_rho(qs: Real, t: Real) -> Real {
    let c5les = C3LES * (TMELT - C4LES);
    let beta = c5les / ((t - C4LES) * (t - C4LES)) - 1.0 / t;
    beta * qs
}

/// Isochoric heat capacity of moist air with condensate, per unit mass
#[inline]
fn moist_heat_capacity(qv: Real, qliq: Real, qice: Real) -> Real {
    let qtot = qliq + qice + qv;
    CVD * (1.0 - qtot) + CVV * qv + CLW * qliq + CI * qice
}

/// Internal energy of a layer (J/m²)
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `qv` - Vapor mass fraction
/// * `qliq` - Liquid mass fraction (cloud + rain)
/// * `qice` - Frozen mass fraction (ice + snow + graupel)
/// * `rho` - Air density (kg/m³)
/// * `dz` - Layer thickness (m)
#[inline]
pub fn internal_energy(t: Real, qv: Real, qliq: Real, qice: Real, rho: Real, dz: Real) -> Real {
    let cv = moist_heat_capacity(qv, qliq, qice);
    rho * dz * (cv * t - qliq * LVC - qice * LSC)
}

/// Temperature of a layer from its internal energy; inverse of [`internal_energy`]
#[inline]
pub fn t_from_internal_energy(
    u: Real,
    qv: Real,
    qliq: Real,
    qice: Real,
    rho: Real,
    dz: Real,
) -> Real {
    let column_mass = rho * dz;
    let cv = moist_heat_capacity(qv, qliq, qice) * column_mass;
    (u + column_mass * (qliq * LVC + qice * LSC)) / cv
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_saturation_at_melting_point() {
        // Both curves meet at the triple point
        let rho = 1.0;
        assert_relative_eq!(qsat_rho(TMELT, rho), qsat_ice_rho(TMELT, rho), max_relative = 1e-12);
        assert_relative_eq!(qsat_rho(TMELT, rho), C1ES / (RV * TMELT), max_relative = 1e-12);
    }

    #[test]
    fn test_ice_saturation_below_liquid_when_cold() {
        for t in [230.0, 250.0, 265.0] {
            assert!(qsat_ice_rho(t, 1.0) < qsat_rho(t, 1.0), "at {t} K");
        }
    }

    #[test]
    fn test_saturation_increases_with_temperature() {
        let mut previous = 0.0;
        for t in (220..320).step_by(5) {
            let q = qsat_rho(Real::from(t as u16), 1.0);
            assert!(q > previous);
            previous = q;
        }
    }

    #[test]
    fn test_dqsatdt_matches_finite_difference() {
        let t = 285.0;
        let h = 1e-3;
        let numeric = (qsat_rho(t + h, 1.0) - qsat_rho(t - h, 1.0)) / (2.0 * h);
        let analytic = dqsatdt_rho(qsat_rho(t, 1.0), t);
        assert_relative_eq!(numeric, analytic, max_relative = 1e-5);
    }

    #[test]
    fn test_internal_energy_inverse() {
        let (qv, qliq, qice, rho, dz) = (8e-3, 1e-3, 5e-4, 0.9, 250.0);
        for t in [240.0, 273.15, 300.0] {
            let u = internal_energy(t, qv, qliq, qice, rho, dz);
            assert_relative_eq!(
                t_from_internal_energy(u, qv, qliq, qice, rho, dz),
                t,
                max_relative = 1e-12
            );
        }
    }
}
