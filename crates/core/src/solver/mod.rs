//! Graupel microphysics kernel
//!
//! One call advances the state by a single time step in four phases:
//!
//! 1. Active-cell filter: compacts cells with condensate or cold
//!    ice-supersaturated vapor into a worklist, and records per column the
//!    shallowest level of each precipitating species.
//! 2. Transfer network: evaluates the 6×6 transfer matrix of every active
//!    cell, limits it against the available stock, and integrates the mass.
//! 3. Thermodynamic update: latent heating from the net tendencies.
//! 4. Sedimentation: per-column semi-implicit sweep of rain, ice, snow and
//!    graupel with energy-flux coupling.
//!
//! Phases 1–3 are parallel over the worklist, phase 4 over columns.
//!
//! # Example
//!
//! ```
//! use muphys_core::grid::{AtmosphericState, GridShape, PrecipitationOutput};
//! use muphys_core::solver::{graupel, KernelParams};
//! use muphys_core::physics::qsat_ice_rho;
//! use muphys_core::Species;
//!
//! let shape = GridShape::new(10, 4);
//! let mut state = AtmosphericState::uniform(shape, 270.0, 80_000.0);
//! state.q[Species::Vapor].fill(qsat_ice_rho(270.0, 1.0));
//! state.q[Species::Snow].fill(1.0e-4);
//! let mut out = PrecipitationOutput::new(shape);
//!
//! let stats = graupel(&mut state, &mut out, &KernelParams::default(), 0..4).unwrap();
//! assert_eq!(stats.active_cells, 40);
//! assert!(out.surface[Species::Snow][0] > 0.0);
//! ```

mod filter;
mod params;
pub mod profiler;
mod sedimentation;
mod thermodynamic;
mod transfer;

pub use filter::{exclusive_prefix_sum, par_filter_indices, ActiveCells, CellIndex, KminTable};
pub use params::{FilterThresholds, KernelParams};
pub use profiler::{FrameTimer, ProfilerScope};
pub use sedimentation::{precip_step, sediment_column, ColumnState, PrecipUpdate, SurfaceRates};
pub use thermodynamic::{mixture_heat_capacity, temperature_increment};
pub use transfer::{
    limit_budget, transfer_rates, update_cell, CellRates, CellUpdate, TransferMatrix,
};

use crate::grid::{AtmosphericState, GridError, PrecipitationOutput};
use std::ops::Range;
use tracing::debug;

/// Summary of one kernel call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelStats {
    /// Cells processed by the transfer network
    pub active_cells: usize,
    /// Columns swept by sedimentation
    pub sedimented_columns: usize,
}

/// Advance `state` by one time step over the column range `columns`
///
/// Temperature and the six species are updated in place; the precipitation
/// flux profile and surface rates are written to `out`. The surface rates
/// are also read as the flux entering the first swept level. Columns outside
/// `columns` are not touched.
///
/// # Errors
///
/// Returns a [`GridError`] if the fields disagree in shape or the column
/// range is empty or exceeds the grid. The state is unchanged in that case.
pub fn graupel(
    state: &mut AtmosphericState,
    out: &mut PrecipitationOutput,
    params: &KernelParams,
    columns: Range<usize>,
) -> Result<KernelStats, GridError> {
    state.validate()?;
    out.validate(state.shape())?;
    state.check_columns(&columns)?;

    let _scope = ProfilerScope::new("graupel");

    let active = {
        let _scope = ProfilerScope::new("filter");
        ActiveCells::scan(state, columns.clone(), &params.thresholds)
    };
    debug!(
        active = active.len(),
        cells = state.shape().levels * columns.len(),
        "active-cell filter"
    );

    {
        let _scope = ProfilerScope::new("transfer");
        transfer::apply_transfers(state, active.cells(), params);
    }

    let sedimented_columns = {
        let _scope = ProfilerScope::new("sedimentation");
        sedimentation::sediment(state, out, active.kmin(), params)
    };
    debug!(columns = sedimented_columns, "sedimentation");

    Ok(KernelStats {
        active_cells: active.len(),
        sedimented_columns,
    })
}

/// Advance every column of `state` by one time step
///
/// # Errors
///
/// See [`graupel`].
pub fn graupel_all(
    state: &mut AtmosphericState,
    out: &mut PrecipitationOutput,
    params: &KernelParams,
) -> Result<KernelStats, GridError> {
    let columns = 0..state.shape().columns;
    graupel(state, out, params, columns)
}
