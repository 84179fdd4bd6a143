//! Sedimentation of the precipitating species
//!
//! Each column is swept level by level, starting at the shallowest level
//! holding any precipitating species. Mass falling out of a level enters the
//! next one through a semi-implicit flux update; the enthalpy carried by the
//! falling condensate is passed down as an energy flux and the temperature is
//! recovered from the updated internal energy.
//!
//! Columns are independent and run in parallel. A column is gathered into
//! contiguous buffers, swept, then scattered back into the grid.

use super::filter::KminTable;
use super::params::KernelParams;
use crate::core_types::{PrecipArray, Real, Species, SpeciesArray, NUM_PRECIPITATING};
use crate::grid::{AtmosphericState, Field2D, PrecipitationOutput};
use crate::physics::constants::{CI, CLW, CVD, LSC, LVC, RHO_00};
use crate::physics::{
    fall_speed, internal_energy, t_from_internal_energy, vel_scale_factor, FallSpeedParams,
    FALL_SPEED,
};
use rayon::prelude::*;

/// Outcome of one semi-implicit update of one species at one level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecipUpdate {
    /// Updated mass fraction
    pub q: Real,
    /// Flux leaving the level downwards (kg/m²/s)
    pub flux: Real,
    /// Terminal velocity at the interface below (m/s)
    pub velocity: Real,
}

/// Semi-implicit sedimentation update of one species at one level
///
/// # Arguments
/// * `law` - Fall-speed law of the species
/// * `zeta` - Implicit coefficient `dt / (2 dz)` (s/m)
/// * `vc` - Terminal-velocity scale factor
/// * `flux_in` - Flux entering from above (kg/m²/s)
/// * `vt` - Terminal velocity carried from the level above (m/s)
/// * `q` - Mass fraction at this level
/// * `q_below` - Mass fraction at the next level of the sweep
/// * `rho` - Air density (kg/m³)
#[must_use]
pub fn precip_step(
    law: &FallSpeedParams,
    zeta: Real,
    vc: Real,
    flux_in: Real,
    vt: Real,
    q: Real,
    q_below: Real,
    rho: Real,
) -> PrecipUpdate {
    let rho_x = q * rho;
    let flux_eff = rho_x / zeta + 2.0 * flux_in;
    // Cannot drain more than the level holds plus what enters it
    let flux_partial = (rho_x * vc * fall_speed(rho_x, law)).min(flux_eff);

    let q_new = zeta * (flux_eff - flux_partial) / ((1.0 + zeta * vt) * rho);
    let flux = 0.5 * (q_new * rho * vt + flux_partial);
    let velocity = vc * fall_speed(0.5 * (q_new + q_below) * rho, law);

    PrecipUpdate {
        q: q_new,
        flux,
        velocity,
    }
}

/// Contiguous copy of one column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnState {
    /// Temperature (K)
    pub t: Vec<Real>,
    /// Air density (kg/m³)
    pub rho: Vec<Real>,
    /// Layer thickness (m)
    pub dz: Vec<Real>,
    /// Mass fractions
    pub q: SpeciesArray<Vec<Real>>,
    /// Combined precipitation flux (kg/m²/s)
    pub pflx: Vec<Real>,
}

impl ColumnState {
    /// Copy `column` out of the grid
    #[must_use]
    pub fn gather(state: &AtmosphericState, pflx: &Field2D, column: usize) -> Self {
        Self {
            t: state.temperature.column(column),
            rho: state.density.column(column),
            dz: state.thickness.column(column),
            q: SpeciesArray::from_fn(|s| state.q[s].column(column)),
            pflx: pflx.column(column),
        }
    }

    /// Write the fields changed by sedimentation back into the grid
    pub fn scatter(&self, state: &mut AtmosphericState, pflx: &mut Field2D, column: usize) {
        state.temperature.set_column(column, &self.t);
        for species in Species::PRECIPITATING {
            state.q[species].set_column(column, &self.q[species]);
        }
        pflx.set_column(column, &self.pflx);
    }

    /// Number of levels
    #[must_use]
    pub fn levels(&self) -> usize {
        self.t.len()
    }

    fn liquid(&self, k: usize) -> Real {
        self.q[Species::Cloud][k] + self.q[Species::Rain][k]
    }

    fn frozen(&self, k: usize) -> Real {
        Species::FROZEN.iter().map(|&s| self.q[s][k]).sum()
    }
}

/// Per-column surface accumulators
///
/// On entry the species fluxes are the flux entering the first swept level;
/// on exit they hold the flux leaving the last swept level.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceRates {
    /// Flux per precipitating species (kg/m²/s)
    pub flux: PrecipArray<Real>,
    /// Energy flux term at the bottom level (W/m²)
    pub energy: Real,
}

impl SurfaceRates {
    fn gather(out: &PrecipitationOutput, column: usize) -> Self {
        Self {
            flux: PrecipArray::from_fn(|s| out.surface[s][column]),
            energy: out.energy[column],
        }
    }

    fn scatter(&self, out: &mut PrecipitationOutput, column: usize) {
        for (species, &flux) in self.flux.iter() {
            out.surface[species][column] = flux;
        }
        out.energy[column] = self.energy;
    }
}

/// Sweep one column
///
/// # Arguments
/// * `column` - Column buffers, updated in place
/// * `surface` - Boundary fluxes in, surface rates out
/// * `kmin` - Shallowest level of each precipitating species
/// * `params` - Kernel parameters
pub fn sediment_column(
    column: &mut ColumnState,
    surface: &mut SurfaceRates,
    kmin: &PrecipArray<Option<usize>>,
    params: &KernelParams,
) {
    let Some(threshold) = kmin.0.iter().flatten().copied().min() else {
        return;
    };
    let ke = column.levels();
    let dt = params.dt;
    let k_end = if params.rain_out { ke } else { ke.saturating_sub(1) };

    let mut vt = PrecipArray([0.0; NUM_PRECIPITATING]);
    let mut eflx = 0.0;

    for k in params.kstart.max(threshold)..k_end {
        let kp1 = (k + 1).min(ke - 1);
        let rho = column.rho[k];
        let dz = column.dz[k];
        let t = column.t[k];
        let qv = column.q[Species::Vapor][k];

        let mut e_int = internal_energy(t, qv, column.liquid(k), column.frozen(k), rho, dz) + eflx;
        let zeta = dt / (2.0 * dz);
        let xrho = (RHO_00 / rho).sqrt();

        for species in Species::PRECIPITATING {
            if kmin[species].is_none_or(|first| k < first) {
                continue;
            }
            let q = &mut column.q[species];
            let vc = vel_scale_factor(species, xrho, rho, t, q[k]);
            let update = precip_step(
                &FALL_SPEED[species],
                zeta,
                vc,
                surface.flux[species],
                vt[species],
                q[k],
                q[kp1],
                rho,
            );
            q[k] = update.q;
            surface.flux[species] = update.flux;
            vt[species] = update.velocity;
        }

        let frozen_flux: Real = Species::FROZEN.iter().map(|&s| surface.flux[s]).sum();
        let rain_flux = surface.flux[Species::Rain];
        let t_below = column.t[kp1];
        eflx = dt
            * (rain_flux * (CLW * t - CVD * t_below - LVC)
                + frozen_flux * (CI * t - CVD * t_below - LSC));
        column.pflx[k] = frozen_flux + rain_flux;

        e_int -= eflx;
        column.t[k] =
            t_from_internal_energy(e_int, qv, column.liquid(k), column.frozen(k), rho, dz);

        if k == ke - 1 {
            surface.energy = eflx / dt;
        }
    }
}

/// Sediment every column of the `kmin` table's range
pub(crate) fn sediment(
    state: &mut AtmosphericState,
    out: &mut PrecipitationOutput,
    kmin: &KminTable,
    params: &KernelParams,
) -> usize {
    let columns: Vec<usize> = kmin
        .columns()
        .filter(|&column| kmin.threshold(column).is_some())
        .collect();

    let mut work: Vec<(ColumnState, SurfaceRates)> = {
        let state = &*state;
        let out = &*out;
        columns
            .par_iter()
            .map(|&column| {
                (
                    ColumnState::gather(state, &out.pflx, column),
                    SurfaceRates::gather(out, column),
                )
            })
            .collect()
    };

    work.par_iter_mut()
        .zip(columns.par_iter())
        .for_each(|((column_state, surface), &column)| {
            sediment_column(column_state, surface, kmin.column(column), params);
        });

    for ((column_state, surface), &column) in work.iter().zip(&columns) {
        column_state.scatter(state, &mut out.pflx, column);
        surface.scatter(out, column);
    }
    columns.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridShape;
    use approx::assert_relative_eq;

    fn rain_law() -> FallSpeedParams {
        FALL_SPEED[Species::Rain]
    }

    #[test]
    fn test_precip_step_uncapped() {
        // Thick layer: the partial flux stays below the effective flux
        let (q, rho, dz, dt) = (1e-3, 1.0, 1000.0, 30.0);
        let zeta = dt / (2.0 * dz);
        let update = precip_step(&rain_law(), zeta, 1.0, 0.0, 0.0, q, 0.0, rho);

        let v = 14.58 * (rho * q + 1e-12).powf(0.111);
        let partial = rho * q * v;
        assert!(partial < rho * q / zeta);
        let q_new = zeta * (rho * q / zeta - partial) / rho;
        assert_relative_eq!(update.q, q_new, max_relative = 1e-12);
        assert_relative_eq!(update.flux, 0.5 * partial, max_relative = 1e-12);
        assert_relative_eq!(
            update.velocity,
            14.58 * (0.5 * q_new * rho + 1e-12).powf(0.111),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_precip_step_capped() {
        // Thin layer: everything that is there falls out
        let (q, rho, dz, dt) = (1e-3, 1.0, 10.0, 30.0);
        let zeta = dt / (2.0 * dz);
        let update = precip_step(&rain_law(), zeta, 1.0, 0.0, 0.0, q, 0.0, rho);
        assert_eq!(update.q, 0.0);
        assert_relative_eq!(update.flux, 0.5 * rho * q / zeta, max_relative = 1e-12);
    }

    #[test]
    fn test_precip_step_empty_level_passes_flux() {
        let zeta = 0.15;
        let flux_in = 2e-3;
        let update = precip_step(&rain_law(), zeta, 1.0, flux_in, 5.0, 0.0, 0.0, 1.0);
        assert!(update.q > 0.0);
        assert!(update.flux > 0.0);
        assert!(update.q.is_finite() && update.flux.is_finite());
    }

    fn single_rain_column(levels: usize, qr: Real) -> (AtmosphericState, PrecipitationOutput) {
        let shape = GridShape::new(levels, 1);
        let mut state = AtmosphericState::uniform(shape, 285.0, 90_000.0);
        state.thickness.fill(100.0);
        state.q[Species::Rain].set(0, 0, qr);
        (state, PrecipitationOutput::new(shape))
    }

    #[test]
    fn test_single_level_rain_falls_out() {
        let (mut state, mut out) = single_rain_column(1, 1e-3);
        let params = KernelParams::default();
        let kmin = KminTable::scan(&state, 0..1, params.thresholds.qmin);
        let swept = sediment(&mut state, &mut out, &kmin, &params);
        assert_eq!(swept, 1);

        let zeta = params.dt / 200.0;
        let vc = (RHO_00 / 1.0).sqrt();
        let expected = precip_step(&rain_law(), zeta, vc, 0.0, 0.0, 1e-3, 1e-3, 1.0);
        assert_relative_eq!(state.q[Species::Rain].get(0, 0), expected.q);
        assert_relative_eq!(out.surface[Species::Rain][0], expected.flux);
        assert_relative_eq!(out.pflx.get(0, 0), expected.flux);
        // Bottom level reached: the energy term is written
        assert!(out.energy[0] != 0.0);
    }

    #[test]
    fn test_dry_column_untouched() {
        let (mut state, mut out) = single_rain_column(4, 0.0);
        out.surface[Species::Snow][0] = 7.0;
        let before = state.clone();
        let kmin = KminTable::scan(&state, 0..1, 1e-15);
        let swept = sediment(&mut state, &mut out, &kmin, &KernelParams::default());
        assert_eq!(swept, 0);
        assert_eq!(state, before);
        assert_eq!(out.surface[Species::Snow][0], 7.0);
    }

    #[test]
    fn test_rain_moves_down_and_conserves_mass() {
        let levels = 6;
        let (mut state, mut out) = single_rain_column(levels, 2e-4);
        let params = KernelParams::default();
        let kmin = KminTable::scan(&state, 0..1, params.thresholds.qmin);
        sediment(&mut state, &mut out, &kmin, &params);

        // Mass that left the column during the step
        let column_mass: Real = (0..levels)
            .map(|k| state.q[Species::Rain].get(k, 0) * 100.0)
            .sum();
        assert!(state.q[Species::Rain].get(0, 0) < 2e-4);
        assert!(state.q[Species::Rain].get(1, 0) > 0.0);
        assert!(column_mass <= 2e-4 * 100.0 * (1.0 + 1e-12));
        for k in 0..levels {
            assert!(state.q[Species::Rain].get(k, 0) >= 0.0);
        }
    }

    #[test]
    fn test_without_rain_out_bottom_level_skipped() {
        let levels = 3;
        let (mut state, mut out) = single_rain_column(levels, 1e-4);
        state.q[Species::Rain].set(levels - 1, 0, 1e-4);
        out.energy[0] = -1.0;
        let params = KernelParams {
            rain_out: false,
            ..KernelParams::default()
        };
        let kmin = KminTable::scan(&state, 0..1, params.thresholds.qmin);
        sediment(&mut state, &mut out, &kmin, &params);

        assert_eq!(state.q[Species::Rain].get(levels - 1, 0), 1e-4);
        assert_eq!(out.pflx.get(levels - 1, 0), 0.0);
        assert_eq!(out.energy[0], -1.0);
    }

    #[test]
    fn test_kstart_skips_upper_levels() {
        let (mut state, mut out) = single_rain_column(4, 1e-4);
        let params = KernelParams {
            kstart: 1,
            ..KernelParams::default()
        };
        let kmin = KminTable::scan(&state, 0..1, params.thresholds.qmin);
        sediment(&mut state, &mut out, &kmin, &params);
        assert_eq!(state.q[Species::Rain].get(0, 0), 1e-4);
        assert_eq!(out.pflx.get(0, 0), 0.0);
    }

    #[test]
    fn test_species_skipped_above_own_kmin() {
        let (mut state, mut out) = single_rain_column(4, 1e-4);
        state.q[Species::Snow].set(2, 0, 1e-4);
        // Boundary snow flux is not deposited above the first snowy level
        out.surface[Species::Snow][0] = 1e-3;
        let params = KernelParams::default();
        let kmin = KminTable::scan(&state, 0..1, params.thresholds.qmin);
        assert_eq!(kmin.level(0, Species::Snow), Some(2));

        sediment(&mut state, &mut out, &kmin, &params);
        assert_eq!(state.q[Species::Snow].get(0, 0), 0.0);
        assert_eq!(state.q[Species::Snow].get(1, 0), 0.0);
        assert!(state.q[Species::Snow].get(2, 0) > 0.0);
        assert!(state.q[Species::Rain].get(1, 0) > 0.0);
    }
}
