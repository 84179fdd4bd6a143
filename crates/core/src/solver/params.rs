//! Kernel configuration
//!
//! Scalar inputs of one kernel call. Both structures deserialize with every
//! field optional, falling back to the defaults of the graupel scheme.

use crate::core_types::Real;
use crate::physics::constants::{QMIN, TFRZ_HET2};
use serde::{Deserialize, Serialize};

/// Scalar parameters of one kernel call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelParams {
    /// Time step (s)
    pub dt: Real,

    /// Cloud droplet number concentration, held fixed by the single-moment closure
    pub qnc: Real,

    /// Surface rain-out.
    ///
    /// When enabled the sedimentation sweep runs to the bottom level and the
    /// surface energy term is written; when disabled it stops one level short.
    pub rain_out: bool,

    /// First level of the sedimentation sweep
    pub kstart: usize,

    /// Thresholds of the active-cell filter
    pub thresholds: FilterThresholds,
}

impl Default for KernelParams {
    /// Defaults of the graupel driver: 30 s step, 100 droplets per cm³.
    fn default() -> Self {
        Self {
            dt: 30.0,
            qnc: 100.0,
            rain_out: true,
            kstart: 0,
            thresholds: FilterThresholds::default(),
        }
    }
}

impl KernelParams {
    /// Parameters with a given time step and droplet number, defaults elsewhere
    #[must_use]
    pub fn new(dt: Real, qnc: Real) -> Self {
        Self {
            dt,
            qnc,
            ..Self::default()
        }
    }
}

/// Thresholds deciding whether a cell needs microphysics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterThresholds {
    /// Mass fraction above which a species counts as present
    pub qmin: Real,

    /// Temperature below which ice-supersaturated vapor activates a cell (K)
    pub t_het: Real,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            qmin: QMIN,
            t_het: TFRZ_HET2,
        }
    }
}
