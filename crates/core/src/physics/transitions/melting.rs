//! Melting of snow and graupel into rain

use crate::core_types::Real;
use crate::physics::constants::{QMIN, TMELT, TX};

/// Melting rate shared by snow and graupel
///
/// Active once the temperature exceeds both the melting point and the
/// wet-bulb correction `tmelt - tx * dvsw0`.
#[inline]
fn melting_rate(
    t: Real,
    p: Real,
    rho: Real,
    dvsw0: Real,
    q: Real,
    c1: Real,
    c2: Real,
    exponent: Real,
) -> Real {
    const A_MELT: Real = TX - 389.5;

    if q > QMIN && t > TMELT.max(TMELT - TX * dvsw0) {
        (c1 / p + c2) * (t - TMELT + A_MELT * dvsw0) * (q * rho).powf(exponent)
    } else {
        0.0
    }
}

/// Snow melting into rain (1/s)
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `p` - Pressure (Pa)
/// * `rho` - Air density (kg/m³)
/// * `dvsw0` - Vapor excess over liquid saturation at the melting point
/// * `qs` - Snow mass fraction
pub fn snow_to_rain(t: Real, p: Real, rho: Real, dvsw0: Real, qs: Real) -> Real {
    melting_rate(t, p, rho, dvsw0, qs, 79.6863, 0.612_654e-3, 0.8)
}

/// Graupel melting into rain (1/s)
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `p` - Pressure (Pa)
/// * `rho` - Air density (kg/m³)
/// * `dvsw0` - Vapor excess over liquid saturation at the melting point
/// * `qg` - Graupel mass fraction
pub fn graupel_to_rain(t: Real, p: Real, rho: Real, dvsw0: Real, qg: Real) -> Real {
    melting_rate(t, p, rho, dvsw0, qg, 12.31698, 7.39441e-05, 0.6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_melting_below_freezing() {
        assert_eq!(snow_to_rain(TMELT - 1.0, 9e4, 1.1, 0.0, 1e-3), 0.0);
        assert_eq!(graupel_to_rain(TMELT - 1.0, 9e4, 1.1, 0.0, 1e-3), 0.0);
    }

    #[test]
    fn test_melting_above_freezing() {
        let snow = snow_to_rain(TMELT + 3.0, 9e4, 1.1, 0.0, 1e-3);
        let graupel = graupel_to_rain(TMELT + 3.0, 9e4, 1.1, 0.0, 1e-3);
        assert!(snow > 0.0);
        assert!(graupel > 0.0);
    }

    #[test]
    fn test_dry_air_delays_melting() {
        // Evaporative cooling: subsaturated air raises the onset temperature
        let t = TMELT + 1.0;
        assert!(snow_to_rain(t, 9e4, 1.1, 0.0, 1e-3) > 0.0);
        assert_eq!(snow_to_rain(t, 9e4, 1.1, -1e-3, 1e-3), 0.0);
    }

    #[test]
    fn test_melting_needs_mass() {
        assert_eq!(snow_to_rain(TMELT + 5.0, 9e4, 1.1, 0.0, 0.0), 0.0);
        assert_eq!(graupel_to_rain(TMELT + 5.0, 9e4, 1.1, 0.0, QMIN), 0.0);
    }
}
