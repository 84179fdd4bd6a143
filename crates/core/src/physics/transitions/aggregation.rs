//! Conversion of cloud ice into snow

use crate::core_types::Real;
use crate::physics::constants::{QMIN, V0S, V1S};

/// Ice-to-snow conversion by depositional growth of large crystals (1/s)
///
/// Crystals growing by deposition towards the snow size threshold are
/// transferred at a rate set by their distance to that threshold.
///
/// # Arguments
/// * `qi` - Cloud ice mass fraction
/// * `mi` - Ice crystal mass (kg)
/// * `ice_dep` - Vapor deposition rate onto ice (1/s)
pub fn deposition_auto_conversion(qi: Real, mi: Real, ice_dep: Real) -> Real {
    const M0_S: Real = 3.0e-9;
    const B_DEP: Real = 0.666_666_666_666_67;
    const XCRIT: Real = 1.0;

    if qi <= QMIN {
        return 0.0;
    }
    let tau_inverse = B_DEP / ((M0_S / mi).powf(B_DEP) - XCRIT);
    ice_dep.max(0.0) * tau_inverse
}

/// Ice-to-snow conversion by autoconversion and aggregation (1/s)
///
/// # Arguments
/// * `qi` - Cloud ice mass fraction
/// * `ns` - Snow intercept parameter (1/m⁴)
/// * `lambda` - Snow slope parameter (1/m)
/// * `sticking_eff` - Ice sticking efficiency
pub fn ice_to_snow(qi: Real, ns: Real, lambda: Real, sticking_eff: Real) -> Real {
    const QI0: Real = 0.0;
    const C_IAU: Real = 1.0e-3;
    const C_AGG: Real = 2.61 * V0S;
    const B_AGG: Real = -(V1S + 3.0);

    if qi <= QMIN {
        return 0.0;
    }
    sticking_eff * (C_IAU * (qi - QI0).max(0.0) + qi * (C_AGG * ns) * lambda.powf(B_AGG))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::properties::{ice_sticking, snow_lambda, snow_number};

    #[test]
    fn test_auto_conversion_only_for_growth() {
        assert_eq!(deposition_auto_conversion(1e-5, 1e-10, -1e-6), 0.0);
        assert!(deposition_auto_conversion(1e-5, 1e-10, 1e-6) > 0.0);
        assert_eq!(deposition_auto_conversion(0.0, 1e-10, 1e-6), 0.0);
    }

    #[test]
    fn test_ice_to_snow_scales_with_sticking() {
        let (t, rho, qs, qi) = (255.0, 1.0, 1e-4, 1e-5);
        let ns = snow_number(t, rho, qs);
        let lambda = snow_lambda(rho, qs, ns);
        let low = ice_to_snow(qi, ns, lambda, 0.1);
        let high = ice_to_snow(qi, ns, lambda, 0.2);
        assert!(low > 0.0);
        assert!((high - 2.0 * low).abs() <= 1e-12 * high);
        assert!(ice_to_snow(qi, ns, lambda, ice_sticking(t)) > 0.0);
    }

    #[test]
    fn test_ice_to_snow_without_snow_is_autoconversion() {
        // No snow: slope is huge, aggregation vanishes, autoconversion remains
        let ns = snow_number(255.0, 1.0, 0.0);
        let lambda = snow_lambda(1.0, 0.0, ns);
        let rate = ice_to_snow(1e-5, ns, lambda, 1.0);
        assert!((rate - 1.0e-3 * 1e-5).abs() < 1e-15);
    }
}
