//! Species-transfer network and budget limiter
//!
//! For one active cell the rate laws are evaluated into a 6×6 matrix of
//! directed, non-negative transfer rates (`from → to`, 1/s). Rows whose total
//! outflow would exhaust the source species within the step are rescaled, and
//! the net tendencies are integrated forward with a floor at zero.

use super::filter::CellIndex;
use super::params::{FilterThresholds, KernelParams};
use super::thermodynamic::temperature_increment;
use crate::core_types::{Real, Species, SpeciesArray, NUM_SPECIES};
use crate::grid::{AtmosphericState, CellState};
use crate::physics::constants::TMELT;
use crate::physics::transitions::{
    cloud_to_graupel, cloud_to_rain, cloud_to_snow, cloud_x_ice, deposition_auto_conversion,
    graupel_to_rain, ice_deposition_nucleation, ice_to_graupel, ice_to_snow, rain_to_graupel,
    rain_to_vapor, snow_to_graupel, snow_to_rain, vapor_x_graupel, vapor_x_ice, vapor_x_snow,
};
use crate::physics::{
    deposition_factor, ice_mass, ice_number, ice_sticking, qsat_ice_rho, qsat_rho, snow_lambda,
    snow_number,
};
use nalgebra::SMatrix;
use rayon::prelude::*;

/// Directed mass-transfer rates between the six species (1/s)
///
/// Entry `(from, to)` is the rate at which `from` converts into `to`. The
/// diagonal stays zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferMatrix(SMatrix<Real, NUM_SPECIES, NUM_SPECIES>);

impl Default for TransferMatrix {
    fn default() -> Self {
        Self::zeros()
    }
}

impl TransferMatrix {
    /// Matrix with every rate zero
    #[must_use]
    pub fn zeros() -> Self {
        Self(SMatrix::zeros())
    }

    /// Rate of `from → to`
    #[inline]
    #[must_use]
    pub fn rate(&self, from: Species, to: Species) -> Real {
        self.0[(from.index(), to.index())]
    }

    /// Set the rate of `from → to`
    #[inline]
    pub fn set(&mut self, from: Species, to: Species, rate: Real) {
        debug_assert!(from != to, "self-transfer of {from}");
        self.0[(from.index(), to.index())] = rate;
    }

    /// Split a signed rate into the `a → b` (positive part) and `b → a`
    /// (negative part) entries
    #[inline]
    pub fn set_signed(&mut self, a: Species, b: Species, signed: Real) {
        self.set(a, b, signed.max(0.0));
        self.set(b, a, -signed.min(0.0));
    }

    /// Total outflow of a species, the row sum
    #[must_use]
    pub fn outflow(&self, from: Species) -> Real {
        self.0.row(from.index()).sum()
    }

    /// Total inflow of a species, the column sum
    #[must_use]
    pub fn inflow(&self, to: Species) -> Real {
        self.0.column(to.index()).sum()
    }

    /// Rescale every outgoing edge of `from` by `factor`
    pub fn scale_outflow(&mut self, from: Species, factor: Real) {
        self.0.row_mut(from.index()).scale_mut(factor);
    }

    /// Iterate over non-zero entries as `(from, to, rate)`
    pub fn nonzero(&self) -> impl Iterator<Item = (Species, Species, Real)> + '_ {
        Species::ALL.into_iter().flat_map(move |from| {
            Species::ALL
                .into_iter()
                .map(move |to| (from, to, self.rate(from, to)))
                .filter(|&(_, _, rate)| rate != 0.0)
        })
    }
}

/// Transfer rates of one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRates {
    /// Directed transfer rates
    pub matrix: TransferMatrix,
    /// Whether snow, ice or graupel is present, enabling the ice-path processes
    pub ice_path_active: bool,
}

impl CellRates {
    /// Whether the budget limiter considers outgoing edges of `species`
    ///
    /// Vapor, cloud and rain are always evaluated; the frozen species only
    /// when the ice path is active.
    #[must_use]
    pub fn is_limited(&self, species: Species) -> bool {
        self.ice_path_active
            || matches!(species, Species::Vapor | Species::Cloud | Species::Rain)
    }
}

/// Evaluate the rate laws of one cell into a transfer matrix
///
/// # Arguments
/// * `cell` - Local state
/// * `dt` - Time step (s)
/// * `qnc` - Cloud droplet number concentration
/// * `thresholds` - Presence threshold gating the ice path, and the
///   nucleation temperature
#[must_use]
pub fn transfer_rates(
    cell: &CellState,
    dt: Real,
    qnc: Real,
    thresholds: &FilterThresholds,
) -> CellRates {
    use Species::{Cloud, Graupel, Ice, Rain, Snow, Vapor};

    let CellState { t, rho, p, q } = *cell;
    let mut m = TransferMatrix::zeros();

    let ice_path_active = q[Snow].max(q[Ice]).max(q[Graupel]) > thresholds.qmin;

    let dvsw = q[Vapor] - qsat_rho(t, rho);
    let qvsi = qsat_ice_rho(t, rho);
    let dvsi = q[Vapor] - qvsi;
    let n_snow = snow_number(t, rho, q[Snow]);
    let l_snow = snow_lambda(rho, q[Snow], n_snow);

    m.set(Cloud, Rain, cloud_to_rain(t, q[Cloud], q[Rain], qnc));
    m.set(Rain, Vapor, rain_to_vapor(t, rho, q[Cloud], q[Rain], dvsw, dt));
    m.set_signed(Cloud, Ice, cloud_x_ice(t, q[Cloud], q[Ice], dt));
    m.set(Cloud, Snow, cloud_to_snow(t, q[Cloud], q[Snow], n_snow, l_snow));
    m.set(Cloud, Graupel, cloud_to_graupel(t, rho, q[Cloud], q[Graupel]));

    let (ice_dep, eta) = if t < TMELT {
        let n_ice = ice_number(t, rho);
        let m_ice = ice_mass(q[Ice], n_ice);
        let x_ice = ice_sticking(t);

        let mut ice_dep = 0.0;
        let mut eta = 0.0;
        if ice_path_active {
            eta = deposition_factor(t, qvsi);
            m.set_signed(Vapor, Ice, vapor_x_ice(q[Ice], m_ice, eta, dvsi, rho, dt));
            ice_dep = m.rate(Vapor, Ice).min(dvsi / dt);

            m.set(
                Ice,
                Snow,
                deposition_auto_conversion(q[Ice], m_ice, ice_dep)
                    + ice_to_snow(q[Ice], n_snow, l_snow, x_ice),
            );
            m.set(Ice, Graupel, ice_to_graupel(rho, q[Rain], q[Graupel], q[Ice], x_ice));
            m.set(Snow, Graupel, snow_to_graupel(t, rho, q[Cloud], q[Snow]));
            m.set(
                Rain,
                Graupel,
                rain_to_graupel(t, rho, q[Cloud], q[Rain], q[Ice], q[Snow], m_ice, dvsw, dt),
            );
        }

        let nucleation =
            ice_deposition_nucleation(t, thresholds.t_het, q[Cloud], q[Ice], n_ice, dvsi, dt);
        m.set(Vapor, Ice, m.rate(Vapor, Ice) + nucleation);
        (ice_dep, eta)
    } else {
        // Riming cannot freeze above the melting point: collected cloud water becomes rain
        let collected = m.rate(Cloud, Rain) + m.rate(Cloud, Snow) + m.rate(Cloud, Graupel);
        m.set(Cloud, Rain, collected);
        m.set(Cloud, Snow, 0.0);
        m.set(Cloud, Graupel, 0.0);
        (0.0, 0.0)
    };

    if ice_path_active {
        let dvsw0 = q[Vapor] - qsat_rho(TMELT, rho);
        m.set_signed(
            Vapor,
            Snow,
            vapor_x_snow(t, p, rho, q[Snow], n_snow, l_snow, eta, ice_dep, dvsw, dvsi, dvsw0, dt),
        );
        m.set_signed(
            Vapor,
            Graupel,
            vapor_x_graupel(t, p, rho, q[Graupel], dvsw, dvsi, dvsw0, dt),
        );
        m.set(Snow, Rain, snow_to_rain(t, p, rho, dvsw0, q[Snow]));
        m.set(Graupel, Rain, graupel_to_rain(t, p, rho, dvsw0, q[Graupel]));
    }

    CellRates {
        matrix: m,
        ice_path_active,
    }
}

/// Rescale rows whose outflow would exceed the stock within the step
///
/// Only species holding more than `qmin` are rescaled. Returns the
/// per-species sink (row sum) after limiting; species skipped by
/// [`CellRates::is_limited`] report a zero sink.
pub fn limit_budget(
    rates: &mut CellRates,
    q: &SpeciesArray<Real>,
    dt: Real,
    qmin: Real,
) -> SpeciesArray<Real> {
    let mut sink = SpeciesArray([0.0; NUM_SPECIES]);
    for species in Species::ALL {
        if !rates.is_limited(species) {
            continue;
        }
        let mut outflow = rates.matrix.outflow(species);
        let stock_rate = q[species] / dt;
        if outflow > stock_rate && q[species] > qmin {
            rates.matrix.scale_outflow(species, stock_rate / outflow);
            outflow = rates.matrix.outflow(species);
        }
        sink[species] = outflow;
    }
    sink
}

/// Result of the transfer network for one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellUpdate {
    /// Updated mass fractions
    pub q: SpeciesArray<Real>,
    /// Net tendencies (1/s)
    pub dqdt: SpeciesArray<Real>,
    /// Updated temperature (K)
    pub t: Real,
}

/// Advance one cell through the transfer network and the latent-heat update
#[must_use]
pub fn update_cell(cell: &CellState, params: &KernelParams) -> CellUpdate {
    let dt = params.dt;
    let mut rates = transfer_rates(cell, dt, params.qnc, &params.thresholds);
    let sink = limit_budget(&mut rates, &cell.q, dt, params.thresholds.qmin);

    let dqdt = SpeciesArray::from_fn(|s| rates.matrix.inflow(s) - sink[s]);
    let q = SpeciesArray::from_fn(|s| (cell.q[s] + dqdt[s] * dt).max(0.0));
    let t = cell.t + temperature_increment(cell.t, &q, &dqdt, dt);

    CellUpdate { q, dqdt, t }
}

/// Run the transfer network over a worklist and write the results back
///
/// Cells are evaluated in parallel from the unmodified state; no cell reads
/// another's output.
pub(crate) fn apply_transfers(
    state: &mut AtmosphericState,
    cells: &[CellIndex],
    params: &KernelParams,
) {
    let shape = state.shape();
    let updates: Vec<(usize, CellUpdate)> = {
        let state = &*state;
        cells
            .par_iter()
            .map(|cell| {
                let local = state.cell(cell.level, cell.column);
                (
                    shape.index(cell.level, cell.column),
                    update_cell(&local, params),
                )
            })
            .collect()
    };

    for (idx, update) in updates {
        state.temperature.as_mut_slice()[idx] = update.t;
        for species in Species::ALL {
            state.q[species].as_mut_slice()[idx] = update.q[species];
        }
    }
}
