//! Mass-transfer rate laws between water species
//!
//! Every function is a pure map from local cell state to a rate in 1/s.
//! Laws named `a_to_b` are one-directional and never negative; laws named
//! `a_x_b` are bidirectional and return a signed rate (positive for `a → b`).

mod aggregation;
mod deposition;
mod freezing;
mod melting;
mod riming;
mod warm;

pub use aggregation::{deposition_auto_conversion, ice_to_snow};
pub use deposition::{vapor_x_graupel, vapor_x_ice, vapor_x_snow};
pub use freezing::{cloud_x_ice, ice_deposition_nucleation, rain_to_graupel};
pub use melting::{graupel_to_rain, snow_to_rain};
pub use riming::{cloud_to_graupel, cloud_to_snow, ice_to_graupel, snow_to_graupel};
pub use warm::{cloud_to_rain, rain_to_vapor};
