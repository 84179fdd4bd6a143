//! Rate-law library of the graupel scheme
//!
//! Pure functions of local cell state: saturation and internal-energy
//! relations, particle properties, and the species transition rates that
//! populate the transfer matrix.

pub mod constants;
pub mod properties;
pub mod thermo;
pub mod transitions;

pub use properties::{
    deposition_factor, fall_speed, ice_mass, ice_number, ice_sticking, snow_lambda, snow_number,
    vel_scale_factor, FallSpeedParams, FALL_SPEED,
};
pub use thermo::{dqsatdt_rho, internal_energy, qsat_ice_rho, qsat_rho, t_from_internal_energy};
