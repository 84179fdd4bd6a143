//! Freezing, melting of cloud ice, and ice nucleation

use crate::core_types::Real;
use crate::physics::constants::{M0_ICE, QMIN, TFRZ_HET1, TFRZ_HOM, TMELT};

/// Signed exchange between cloud water and cloud ice (1/s)
///
/// Positive: homogeneous freezing of all cloud water below `TFRZ_HOM`.
/// Negative: melting of all cloud ice above `TMELT`.
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `qc` - Cloud water mass fraction
/// * `qi` - Cloud ice mass fraction
/// * `dt` - Time step (s)
pub fn cloud_x_ice(t: Real, qc: Real, qi: Real, dt: Real) -> Real {
    let mut result = 0.0;
    if qc > QMIN && t < TFRZ_HOM {
        result = qc / dt;
    }
    if qi > QMIN && t > TMELT {
        result = -qi / dt;
    }
    result
}

/// Freezing of rain into graupel (1/s)
///
/// Immersion freezing below `TMELT - 2 K` (complete below `TFRZ_HOM`) plus
/// contact freezing by collision with cloud ice when snow is present.
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `rho` - Air density (kg/m³)
/// * `qc`, `qr`, `qi`, `qs` - Cloud, rain, ice, snow mass fractions
/// * `mi` - Ice crystal mass (kg)
/// * `dvsw` - Vapor excess over liquid saturation
/// * `dt` - Time step (s)
pub fn rain_to_graupel(
    t: Real,
    rho: Real,
    qc: Real,
    qr: Real,
    qi: Real,
    qs: Real,
    mi: Real,
    dvsw: Real,
    dt: Real,
) -> Real {
    const TFRZ_RAIN: Real = TMELT - 2.0;
    const A1: Real = 9.95e-5;
    const B1: Real = 1.75;
    const C2: Real = 0.66;
    const C3: Real = 1.0;
    const C4: Real = 0.1;
    const A2: Real = 1.24e-3;
    const B2: Real = 1.625;
    const QS_CRIT: Real = 1.0e-7;

    let mut result = 0.0;
    if qr > QMIN && t < TFRZ_RAIN {
        if t > TFRZ_HOM {
            if dvsw + qc <= 0.0 || qr > C4 * qc {
                result = ((C2 * (TFRZ_RAIN - t)).exp() - C3) * (A1 * (qr * rho).powf(B1));
            }
        } else {
            result = qr / dt;
        }
    }

    if qi.min(qr) > QMIN && qs > QS_CRIT {
        result += A2 * (qi / mi) * (rho * qr).powf(B2);
    }
    result
}

/// Nucleation of cloud ice from vapor or by heterogeneous freezing (1/s)
///
/// Only acts where no cloud ice exists yet; seeds `ni` crystals of the
/// initial crystal mass, limited by the available ice supersaturation.
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `t_het` - Temperature below which ice-supersaturated vapor nucleates (K)
/// * `qc` - Cloud water mass fraction
/// * `qi` - Cloud ice mass fraction
/// * `ni` - Ice number concentration (1/kg)
/// * `dvsi` - Vapor excess over ice saturation
/// * `dt` - Time step (s)
pub fn ice_deposition_nucleation(
    t: Real,
    t_het: Real,
    qc: Real,
    qi: Real,
    ni: Real,
    dvsi: Real,
    dt: Real,
) -> Real {
    let nucleates = (t < t_het && dvsi > 0.0) || (t <= TFRZ_HET1 && qc > QMIN);
    if qi <= QMIN && nucleates {
        (M0_ICE * ni).min(dvsi.max(0.0)) / dt
    } else {
        0.0
    }
}
