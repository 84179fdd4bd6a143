//! Warm-rain processes: autoconversion, accretion, rain evaporation

use crate::core_types::Real;
use crate::physics::constants::{QMIN, TFRZ_HOM, TMELT};

/// Cloud-to-rain conversion by autoconversion and accretion (1/s)
///
/// Seifert and Beheng (2001) two-term closure with a fixed droplet number.
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `qc` - Cloud water mass fraction
/// * `qr` - Rain mass fraction
/// * `nc` - Cloud droplet number concentration
pub fn cloud_to_rain(t: Real, qc: Real, qr: Real, nc: Real) -> Real {
    const QMIN_AC: Real = 1.0e-6;
    const TAU_MAX: Real = 0.90e0;
    const TAU_MIN: Real = 1.0e-30;
    const A_PHI: Real = 6.0e2;
    const B_PHI: Real = 0.68e0;
    const C_PHI: Real = 5.0e-5;
    const AC_KERNEL: Real = 5.25e0;
    const X3: Real = 2.0e0;
    const X2: Real = 2.6e-10;
    const X1: Real = 9.44e9;
    const AU_KERNEL: Real =
        X1 / (20.0 * X2) * (X3 + 2.0) * (X3 + 4.0) / ((X3 + 1.0) * (X3 + 1.0));

    if qc <= QMIN_AC || t <= TFRZ_HOM {
        return 0.0;
    }

    let tau = (1.0 - qc / (qc + qr)).min(TAU_MAX).max(TAU_MIN);
    let phi = tau.powf(B_PHI);
    let phi = A_PHI * phi * (1.0 - phi).powi(3);
    let xau = AU_KERNEL * (qc * qc / nc).powi(2) * (1.0 + phi / (1.0 - tau).powi(2));
    let xac = AC_KERNEL * qc * qr * (tau / (tau + C_PHI)).powi(4);
    xau + xac
}

/// Evaporation of rain in subsaturated air (1/s)
///
/// Only active once cloud water cannot compensate the deficit
/// (`dvsw + qc <= 0`); bounded by a temperature-dependent fraction of the
/// deficit per time step.
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `rho` - Air density (kg/m³)
/// * `qc` - Cloud water mass fraction
/// * `qr` - Rain mass fraction
/// * `dvsw` - Vapor excess over liquid saturation
/// * `dt` - Time step (s)
pub fn rain_to_vapor(t: Real, rho: Real, qc: Real, qr: Real, dvsw: Real, dt: Real) -> Real {
    const B1_RV: Real = 0.16667;
    const B2_RV: Real = 0.55555;
    const C1_RV: Real = 0.61;
    const C2_RV: Real = -0.0163;
    const C3_RV: Real = 1.111e-4;
    const A1_RV: Real = 1.536e-3;
    const A2_RV: Real = 1.0;
    const A3_RV: Real = 19.0621;

    if qr <= QMIN || dvsw + qc > 0.0 {
        return 0.0;
    }

    let tc = t - TMELT;
    let evap_max = (C1_RV + tc * (C2_RV + C3_RV * tc)) * (-dvsw) / dt;
    let rain_density = qr * rho;
    let evap = A1_RV
        * (A2_RV + A3_RV * rain_density.powf(B1_RV))
        * (-dvsw)
        * rain_density.powf(B2_RV);
    evap.min(evap_max)
}
