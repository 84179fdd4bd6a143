//! Riming and collection by snow and graupel

use crate::core_types::Real;
use crate::physics::constants::{QMIN, TFRZ_HOM, V0S, V1S};

/// Riming of cloud water onto snow (1/s)
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `qc` - Cloud water mass fraction
/// * `qs` - Snow mass fraction
/// * `ns` - Snow intercept parameter (1/m⁴)
/// * `lambda` - Snow slope parameter (1/m)
pub fn cloud_to_snow(t: Real, qc: Real, qs: Real, ns: Real, lambda: Real) -> Real {
    const ECS: Real = 0.9;
    const B_RIM: Real = -(V1S + 3.0);
    const C_RIM: Real = 2.61 * ECS * V0S;

    if qc.min(qs) > QMIN && t > TFRZ_HOM {
        C_RIM * ns * qc * lambda.powf(B_RIM)
    } else {
        0.0
    }
}

/// Riming of cloud water onto graupel (1/s)
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `rho` - Air density (kg/m³)
/// * `qc` - Cloud water mass fraction
/// * `qg` - Graupel mass fraction
pub fn cloud_to_graupel(t: Real, rho: Real, qc: Real, qg: Real) -> Real {
    const A_RIM: Real = 4.43;
    const B_RIM: Real = 0.94878;

    if qc.min(qg) > QMIN && t > TFRZ_HOM {
        A_RIM * qc * (qg * rho).powf(B_RIM)
    } else {
        0.0
    }
}

/// Conversion of heavily rimed snow into graupel (1/s)
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `rho` - Air density (kg/m³)
/// * `qc` - Cloud water mass fraction
/// * `qs` - Snow mass fraction
pub fn snow_to_graupel(t: Real, rho: Real, qc: Real, qs: Real) -> Real {
    const A_RIM_CT: Real = 0.5;
    const B_RIM_CT: Real = 0.75;

    if qc.min(qs) > QMIN && t > TFRZ_HOM {
        A_RIM_CT * qc * (qs * rho).powf(B_RIM_CT)
    } else {
        0.0
    }
}

/// Collection of cloud ice by graupel and by rain (1/s)
///
/// # Arguments
/// * `rho` - Air density (kg/m³)
/// * `qr` - Rain mass fraction
/// * `qg` - Graupel mass fraction
/// * `qi` - Cloud ice mass fraction
/// * `sticking_eff` - Ice sticking efficiency
pub fn ice_to_graupel(rho: Real, qr: Real, qg: Real, qi: Real, sticking_eff: Real) -> Real {
    const A_CT: Real = 1.72;
    const B_CT: Real = 0.875;
    const C_AGG_CT: Real = 2.46;
    const B_AGG_CT: Real = 0.94878;

    let mut result = 0.0;
    if qi > QMIN {
        if qg > QMIN {
            result = sticking_eff * qi * C_AGG_CT * (rho * qg).powf(B_AGG_CT);
        }
        if qr > QMIN {
            result += A_CT * qi * (rho * qr).powf(B_CT);
        }
    }
    result
}
