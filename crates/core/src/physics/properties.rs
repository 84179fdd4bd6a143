//! Particle properties: number concentrations, sizes, efficiencies, fall speeds

use super::constants::{ALS, AMS, BMS, QMIN, RD, RV, TMELT};
use crate::core_types::{PrecipArray, Real, Species};

/// Parameters of a power-law fall speed `v = a (ρq + eps)^b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallSpeedParams {
    /// Prefactor `a`
    pub prefactor: Real,
    /// Exponent `b`
    pub exponent: Real,
    /// Regularization offset `eps` (kg/m³)
    pub offset: Real,
}

impl FallSpeedParams {
    const fn new(prefactor: Real, exponent: Real, offset: Real) -> Self {
        Self {
            prefactor,
            exponent,
            offset,
        }
    }

    /// Fall-speed law of `species`, `None` for vapor and cloud water
    #[must_use]
    pub const fn for_species(species: Species) -> Option<Self> {
        match species.precip_index() {
            Some(i) => Some(FALL_SPEED.0[i]),
            None => None,
        }
    }
}

/// Fall-speed laws of the precipitating species
pub const FALL_SPEED: PrecipArray<FallSpeedParams> = PrecipArray([
    FallSpeedParams::new(14.58, 0.111, 1.0e-12),
    FallSpeedParams::new(1.25, 0.160, 1.0e-12),
    FallSpeedParams::new(57.80, 0.5 / 3.0, 1.0e-12),
    FallSpeedParams::new(12.24, 0.217, 1.0e-08),
]);

/// Terminal fall speed of a species from its mass density `ρq` (kg/m³)
#[inline]
pub fn fall_speed(density: Real, params: &FallSpeedParams) -> Real {
    params.prefactor * (density + params.offset).powf(params.exponent)
}

/// Number concentration of cloud ice (1/kg)
///
/// Fletcher-type exponential increase with supercooling, capped.
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `rho` - Air density (kg/m³)
pub fn ice_number(t: Real, rho: Real) -> Real {
    const A_COEFF: Real = 5.000;
    const B_COEFF: Real = 0.304;
    const NIMAX: Real = 250.0e3;
    (A_COEFF * (B_COEFF * (TMELT - t)).exp()).min(NIMAX) / rho
}

/// Mean mass of a cloud ice crystal (kg), bounded to `[1e-12, 1e-9]`
///
/// # Arguments
/// * `qi` - Ice mass fraction
/// * `ni` - Ice number concentration (1/kg)
pub fn ice_mass(qi: Real, ni: Real) -> Real {
    const MI_MAX: Real = 1.0e-9;
    const MI_MIN: Real = 1.0e-12;
    (qi / ni).min(MI_MAX).max(MI_MIN)
}

/// Sticking efficiency of ice
///
/// The larger of an exponential freezing-depression term (capped at one,
/// floored at 0.075) and a temperature-linear term that grows above
/// `tmelt - 85 K`.
///
/// # Arguments
/// * `t` - Temperature (K)
pub fn ice_sticking(t: Real) -> Real {
    const A_FREEZ: Real = 0.09;
    const B_MAX_EXP: Real = 1.00;
    const EFF_MIN: Real = 0.075;
    const EFF_FAC: Real = 3.5e-3;
    const TCRIT: Real = TMELT - 85.0;

    (A_FREEZ * (t - TMELT))
        .exp()
        .min(B_MAX_EXP)
        .max(EFF_MIN)
        .max(EFF_FAC * (t - TCRIT))
}

/// Snow intercept parameter `N0` (1/m⁴) from the Field et al. (2005) moment relation
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `rho` - Air density (kg/m³)
/// * `qs` - Snow mass fraction
pub fn snow_number(t: Real, rho: Real, qs: Real) -> Real {
    const TMIN: Real = TMELT - 40.0;
    const TMAX: Real = TMELT;
    const QSMIN: Real = 2.0e-6;
    const XA1: Real = -1.65;
    const XA2: Real = 5.45e-2;
    const XA3: Real = 3.27e-4;
    const XB1: Real = 1.42;
    const XB2: Real = 1.19e-2;
    const XB3: Real = 9.60e-5;
    const N0S0: Real = 8.00e5;
    const N0S1: Real = 13.5 * 5.65e5;
    const N0S2: Real = -0.107;
    const N0S3: Real = 13.5;
    const N0S4: Real = 0.5 * N0S1;
    const N0S5: Real = 1.0e6;
    const N0S6: Real = 1.0e2 * N0S1;
    const N0S7: Real = 1.0e9;

    if qs <= QMIN {
        return N0S0;
    }

    let tc = t.min(TMAX).max(TMIN) - TMELT;
    let alf = Real::powf(10.0, XA1 + tc * (XA2 + tc * XA3));
    let bet = XB1 + tc * (XB2 + tc * XB3);
    let n0s = N0S3 * ((qs + QSMIN) * rho / AMS).powf(4.0 - 3.0 * bet) / (alf * alf * alf);
    let y = (N0S2 * tc).exp();
    let n0smn = (N0S4 * y).max(N0S5);
    let n0smx = (N0S6 * y).min(N0S7);
    n0s.max(n0smn).min(n0smx)
}

/// Snow size-distribution slope `λ` (1/m)
///
/// # Arguments
/// * `rho` - Air density (kg/m³)
/// * `qs` - Snow mass fraction
/// * `ns` - Snow intercept parameter (1/m⁴)
pub fn snow_lambda(rho: Real, qs: Real, ns: Real) -> Real {
    const A2: Real = AMS * 2.0;
    const LMD_0: Real = 1.0e10;
    const BX: Real = 1.0 / (BMS + 1.0);

    if qs > QMIN {
        (A2 * ns / (qs * rho)).powf(BX)
    } else {
        LMD_0
    }
}

/// Vapor deposition factor for ice growth (diffusion and heat conduction)
///
/// # Arguments
/// * `t` - Temperature (K)
/// * `qvsi` - Saturation mass fraction over ice
pub fn deposition_factor(t: Real, qvsi: Real) -> Real {
    const KAPPA: Real = 2.40e-2;
    const B: Real = 1.94;
    const A: Real = ALS * ALS / (KAPPA * RV);

    let cx = 2.22e-5 * TMELT.powf(-B) * 101_325.0;
    let x = cx / RD * t.powf(B - 1.0);
    x / (1.0 + A * x * qvsi / (t * t))
}

/// Terminal-velocity scale factor of a precipitating species
///
/// Combines the air-density correction `xrho = sqrt(ρ0/ρ)` with the
/// species-specific size-distribution dependence.
///
/// # Arguments
/// * `species` - Precipitating species
/// * `xrho` - Density correction `sqrt(ρ0/ρ)`
/// * `rho` - Air density (kg/m³)
/// * `t` - Temperature (K)
/// * `qx` - Mass fraction of the species
pub fn vel_scale_factor(species: Species, xrho: Real, rho: Real, t: Real, qx: Real) -> Real {
    const B_I: Real = 2.0 / 3.0;
    const B_S: Real = -1.0 / 6.0;

    match species {
        Species::Ice => xrho.powf(B_I),
        Species::Snow => xrho * snow_number(t, rho, qx).powf(B_S),
        _ => xrho,
    }
}
