//! Latent-heat temperature update of the transfer network

use crate::core_types::{Real, Species, SpeciesArray};
use crate::physics::constants::{CI, CLW, CVD, CVV, LSC, LVC};

/// Isochoric heat capacity of the mixture (J/(kg·K))
///
/// `cv = cvd + (cvv - cvd) qtot + (clw - cvv) qliq + (ci - cvv) qice`
#[must_use]
pub fn mixture_heat_capacity(q: &SpeciesArray<Real>) -> Real {
    let qliq = liquid(q);
    let qice = frozen(q);
    let qtot = q[Species::Vapor] + qliq + qice;
    CVD + (CVV - CVD) * qtot + (CLW - CVV) * qliq + (CI - CVV) * qice
}

/// Temperature change from the net species tendencies of one step (K)
///
/// # Arguments
/// * `t` - Temperature before the step (K)
/// * `q` - Mass fractions after the step
/// * `dqdt` - Net tendencies of the step (1/s)
/// * `dt` - Time step (s)
#[must_use]
pub fn temperature_increment(
    t: Real,
    q: &SpeciesArray<Real>,
    dqdt: &SpeciesArray<Real>,
    dt: Real,
) -> Real {
    let cv = mixture_heat_capacity(q);
    let condensation = liquid(dqdt) * (LVC - (CLW - CVV) * t);
    let deposition = frozen(dqdt) * (LSC - (CI - CVV) * t);
    dt * (condensation + deposition) / cv
}

#[inline]
fn liquid(q: &SpeciesArray<Real>) -> Real {
    q[Species::Cloud] + q[Species::Rain]
}

#[inline]
fn frozen(q: &SpeciesArray<Real>) -> Real {
    Species::FROZEN.iter().map(|&s| q[s]).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dry_air_heat_capacity() {
        let q = SpeciesArray([0.0; 6]);
        assert_relative_eq!(mixture_heat_capacity(&q), CVD);
    }

    #[test]
    fn test_no_tendency_no_heating() {
        let q = SpeciesArray([1e-2, 1e-4, 0.0, 0.0, 0.0, 0.0]);
        let dqdt = SpeciesArray([0.0; 6]);
        assert_eq!(temperature_increment(280.0, &q, &dqdt, 30.0), 0.0);
    }

    #[test]
    fn test_condensation_warms_evaporation_cools() {
        let q = SpeciesArray([1e-2, 1e-4, 0.0, 0.0, 0.0, 0.0]);
        let mut dqdt = SpeciesArray([0.0; 6]);
        dqdt[Species::Vapor] = -1e-6;
        dqdt[Species::Cloud] = 1e-6;
        let warming = temperature_increment(280.0, &q, &dqdt, 30.0);
        assert!(warming > 0.0);

        dqdt[Species::Vapor] = 1e-6;
        dqdt[Species::Cloud] = -1e-6;
        assert_relative_eq!(temperature_increment(280.0, &q, &dqdt, 30.0), -warming);
    }

    #[test]
    fn test_deposition_releases_more_than_condensation() {
        let q = SpeciesArray([5e-3, 0.0, 0.0, 1e-5, 0.0, 0.0]);
        let mut to_ice = SpeciesArray([0.0; 6]);
        to_ice[Species::Vapor] = -1e-7;
        to_ice[Species::Ice] = 1e-7;
        let mut to_cloud = SpeciesArray([0.0; 6]);
        to_cloud[Species::Vapor] = -1e-7;
        to_cloud[Species::Cloud] = 1e-7;
        let t = 250.0;
        assert!(
            temperature_increment(t, &q, &to_ice, 30.0)
                > temperature_increment(t, &q, &to_cloud, 30.0)
        );
    }
}
