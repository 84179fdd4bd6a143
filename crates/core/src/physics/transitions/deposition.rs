//! Vapor deposition and sublimation of the frozen species
//!
//! All three laws return a signed rate: positive for deposition
//! (vapor → ice phase), negative for sublimation or evaporation of melting
//! particles.

use crate::core_types::Real;
use crate::physics::constants::{QMIN, TMELT, TX, V0S, V1S};

/// Signed vapor exchange with cloud ice (1/s)
///
/// Zero below `QMIN` ice. Growth cannot overshoot the ice supersaturation
/// within the step; sublimation cannot remove more than the ice present.
///
/// # Arguments
/// * `qi` - Cloud ice mass fraction
/// * `mi` - Ice crystal mass (kg)
/// * `eta` - Deposition factor
/// * `dvsi` - Vapor excess over ice saturation
/// * `rho` - Air density (kg/m³)
/// * `dt` - Time step (s)
pub fn vapor_x_ice(qi: Real, mi: Real, eta: Real, dvsi: Real, rho: Real, dt: Real) -> Real {
    // Form factor of the ice mass-size relation
    const AMI: Real = 130.0;
    // Exponent converting ice mass to surface area, -1 + 0.33
    const B_EXP: Real = -0.67;

    if qi <= QMIN {
        return 0.0;
    }

    let a_fact = 4.0 * AMI.powf(-1.0 / 3.0);
    let rate = (a_fact * eta) * rho * qi * mi.powf(B_EXP) * dvsi;
    if rate > 0.0 {
        rate.min(dvsi / dt)
    } else {
        rate.max(dvsi / dt).max(-qi / dt)
    }
}

/// Signed vapor exchange with snow (1/s)
///
/// Below freezing: ventilated deposition/sublimation over ice, sharing the
/// supersaturation with cloud ice growth `ice_dep`. At or above freezing:
/// evaporation of melting snow driven by the deficit at the melting point.
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `p` - Pressure (Pa)
/// * `rho` - Air density (kg/m³)
/// * `qs` - Snow mass fraction
/// * `ns` - Snow intercept parameter (1/m⁴)
/// * `lambda` - Snow slope parameter (1/m)
/// * `eta` - Deposition factor
/// * `ice_dep` - Vapor deposition rate onto cloud ice (1/s)
/// * `dvsw` - Vapor excess over liquid saturation
/// * `dvsi` - Vapor excess over ice saturation
/// * `dvsw0` - Vapor excess over liquid saturation at the melting point
/// * `dt` - Time step (s)
pub fn vapor_x_snow(
    t: Real,
    p: Real,
    rho: Real,
    qs: Real,
    ns: Real,
    lambda: Real,
    eta: Real,
    ice_dep: Real,
    dvsw: Real,
    dvsi: Real,
    dvsw0: Real,
    dt: Real,
) -> Real {
    // Kinematic viscosity of air (m²/s)
    const NU: Real = 1.75e-5;
    const A0_VS: Real = 1.0;
    const A2_VS: Real = -(V1S + 1.0) / 2.0;
    const EPS: Real = 1.0e-15;
    const QS_LIM: Real = 1.0e-7;
    const CNX: Real = 4.0;
    const B_VS: Real = 0.8;
    const C1_VS: Real = 31282.3;
    const C2_VS: Real = 0.241897;
    const C3_VS: Real = 0.28003;
    const C4_VS: Real = -0.146293e-6;

    if qs <= QMIN {
        return 0.0;
    }

    let snow_density = qs * rho;
    let mut result = if t < TMELT {
        let a1_vs = 0.4182 * (V0S / NU).sqrt();
        let mut rate = (CNX * ns * eta / rho) * (A0_VS + a1_vs * lambda.powf(A2_VS)) * dvsi
            / (lambda * lambda + EPS);
        if rate > 0.0 {
            rate = rate.min(dvsi / dt - ice_dep);
        }
        if qs <= QS_LIM {
            rate = rate.min(0.0);
        }
        rate
    } else if t > TMELT - TX * dvsw0 {
        (C1_VS / p + C2_VS) * dvsw0.min(0.0) * snow_density.powf(B_VS)
    } else {
        (C3_VS + C4_VS * p) * dvsw * snow_density.powf(B_VS)
    };

    result = result.max(-qs / dt);
    result
}

/// Signed vapor exchange with graupel (1/s)
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `p` - Pressure (Pa)
/// * `rho` - Air density (kg/m³)
/// * `qg` - Graupel mass fraction
/// * `dvsw` - Vapor excess over liquid saturation
/// * `dvsi` - Vapor excess over ice saturation
/// * `dvsw0` - Vapor excess over liquid saturation at the melting point
/// * `dt` - Time step (s)
pub fn vapor_x_graupel(
    t: Real,
    p: Real,
    rho: Real,
    qg: Real,
    dvsw: Real,
    dvsi: Real,
    dvsw0: Real,
    dt: Real,
) -> Real {
    const A1_VG: Real = 0.398561;
    const A2_VG: Real = -0.00152398;
    const A3_VG: Real = 2554.99;
    const A4_VG: Real = 2.6531e-7;
    const A5_VG: Real = 0.153907;
    const A6_VG: Real = -7.86703e-07;
    const A7_VG: Real = 0.0418521;
    const A8_VG: Real = -4.7524e-8;
    const B_VG: Real = 0.6;

    if qg <= QMIN {
        return 0.0;
    }

    let graupel_density = (qg * rho).powf(B_VG);
    let result = if t < TMELT {
        (A1_VG + A2_VG * t + A3_VG / p + A4_VG * p) * dvsi * graupel_density
    } else if t > TMELT - TX * dvsw0 {
        (A5_VG + A6_VG * p) * dvsw0.min(0.0) * graupel_density
    } else {
        (A7_VG + A8_VG * p) * dvsw * graupel_density
    };
    result.max(-qg / dt)
}
