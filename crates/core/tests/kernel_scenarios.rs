//! End-to-end scenarios for the graupel kernel
//!
//! Each test builds a small grid by hand, runs one kernel call and checks the
//! outcome against the closed-form behavior of the scheme.

use approx::assert_relative_eq;
use muphys_core::physics::constants::{RHO_00, TMELT};
use muphys_core::physics::{qsat_ice_rho, qsat_rho};
use muphys_core::{
    graupel, graupel_all, AtmosphericState, FilterThresholds, GridError, GridShape,
    KernelParams, PrecipitationOutput, Real, Species,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Grid with uniform density and thickness
fn state_with(shape: GridShape, t: Real, rho: Real, dz: Real) -> AtmosphericState {
    let mut state = AtmosphericState::uniform(shape, t, 90_000.0);
    state.density.fill(rho);
    state.thickness.fill(dz);
    state
}

#[test]
fn test_single_level_rain_sediments() {
    let (rho, dz, dt, qr, t) = (1.0, 100.0, 30.0, 1e-3, 293.15);
    let shape = GridShape::new(1, 1);
    let mut state = state_with(shape, t, rho, dz);
    // Saturated over water: no evaporation, no autoconversion
    state.q[Species::Vapor].fill(qsat_rho(t, rho));
    state.q[Species::Rain].fill(qr);
    let mut out = PrecipitationOutput::new(shape);

    let stats = graupel_all(&mut state, &mut out, &KernelParams::new(dt, 100.0)).unwrap();
    assert_eq!(stats.active_cells, 1);
    assert_eq!(stats.sedimented_columns, 1);

    // Terminal velocity of rain, density-corrected
    let zeta = dt / (2.0 * dz);
    let v = 14.58 * (rho * qr).powf(0.111);
    let xrho = (RHO_00 / rho).sqrt();
    let effective_flux = rho * qr / zeta;
    // A 100 m layer cannot hold 30 s of fall: the flux cap binds
    assert!(rho * qr * xrho * v > effective_flux);

    let surface = out.surface[Species::Rain][0];
    assert_relative_eq!(surface, 0.5 * effective_flux, max_relative = 1e-12);
    assert_relative_eq!(surface, rho * qr * dz / dt, max_relative = 1e-12);
    assert_eq!(state.q[Species::Rain].get(0, 0), 0.0);
    assert_relative_eq!(out.pflx.get(0, 0), surface, max_relative = 1e-12);

    // Mass leaving the column equals what the level lost
    let lost = (qr - state.q[Species::Rain].get(0, 0)) * rho * dz;
    assert_relative_eq!(surface * dt, lost, max_relative = 1e-10);

    // The only level is the bottom one, so the energy term is written
    assert!(out.energy[0] != 0.0);
}

#[test]
fn test_cold_supersaturated_vapor_nucleates_ice() {
    let (t, rho) = (233.0, 0.5);
    let shape = GridShape::new(3, 1);
    let mut state = state_with(shape, t, rho, 200.0);
    let qv = 2.0 * qsat_ice_rho(t, rho);
    state.q[Species::Vapor].fill(qv);
    let mut out = PrecipitationOutput::new(shape);

    let stats = graupel_all(&mut state, &mut out, &KernelParams::default()).unwrap();
    assert_eq!(stats.active_cells, 3);
    // Nothing precipitating existed before the call
    assert_eq!(stats.sedimented_columns, 0);

    for level in 0..3 {
        let qi = state.q[Species::Ice].get(level, 0);
        assert!(qi > 0.0, "level {level} formed no ice");
        assert_relative_eq!(
            state.q[Species::Vapor].get(level, 0) + qi,
            qv,
            max_relative = 1e-12
        );
        for species in [Species::Cloud, Species::Rain, Species::Snow, Species::Graupel] {
            assert_eq!(state.q[species].get(level, 0), 0.0, "{species} at level {level}");
        }
        // Deposition releases latent heat
        assert!(state.temperature.get(level, 0) > t);
    }
    assert!(out.pflx.as_slice().iter().all(|&f| f == 0.0));
    assert_eq!(out.total_surface_rate(0), 0.0);
}

#[test]
fn test_dry_warm_state_is_unchanged() {
    let shape = GridShape::new(6, 5);
    let mut state = state_with(shape, TMELT + 15.0, 1.1, 250.0);
    state.q[Species::Vapor].fill(0.5 * qsat_rho(TMELT + 15.0, 1.1));
    let before = state.clone();
    let mut out = PrecipitationOutput::new(shape);

    let stats = graupel_all(&mut state, &mut out, &KernelParams::default()).unwrap();
    assert_eq!(stats.active_cells, 0);
    assert_eq!(stats.sedimented_columns, 0);
    assert_eq!(state, before);
    assert_eq!(out, PrecipitationOutput::new(shape));
}

#[test]
fn test_trace_condensate_below_qmin_is_ignored() {
    let shape = GridShape::new(4, 2);
    let mut state = state_with(shape, TMELT + 5.0, 1.0, 100.0);
    for species in [Species::Cloud, Species::Rain, Species::Snow] {
        state.q[species].fill(1e-16);
    }
    let before = state.clone();
    let mut out = PrecipitationOutput::new(shape);

    let stats = graupel_all(&mut state, &mut out, &KernelParams::default()).unwrap();
    assert_eq!(stats.active_cells, 0);
    assert_eq!(state, before);
}

#[test]
fn test_columns_outside_range_untouched() {
    let shape = GridShape::new(5, 4);
    let mut state = state_with(shape, 280.0, 1.0, 150.0);
    state.q[Species::Vapor].fill(qsat_rho(280.0, 1.0));
    state.q[Species::Rain].fill(5e-4);
    state.q[Species::Cloud].fill(2e-4);
    let before = state.clone();
    let mut out = PrecipitationOutput::new(shape);
    out.surface[Species::Rain][0] = 7.0;
    out.energy[3] = -3.0;

    let stats = graupel(&mut state, &mut out, &KernelParams::default(), 1..3).unwrap();
    assert_eq!(stats.active_cells, 10);
    assert_eq!(stats.sedimented_columns, 2);

    for column in [0, 3] {
        assert_eq!(state.temperature.column(column), before.temperature.column(column));
        for species in Species::ALL {
            assert_eq!(
                state.q[species].column(column),
                before.q[species].column(column),
                "{species} changed in column {column}"
            );
        }
        assert!(out.pflx.column(column).iter().all(|&f| f == 0.0));
    }
    assert_eq!(out.surface[Species::Rain][0], 7.0);
    assert_eq!(out.energy[3], -3.0);

    for column in [1, 2] {
        assert!(out.surface[Species::Rain][column] > 0.0);
    }
}

#[test]
fn test_incoming_flux_feeds_top_level() {
    let shape = GridShape::new(4, 2);
    let mut state = state_with(shape, 290.0, 1.0, 100.0);
    state.q[Species::Vapor].fill(qsat_rho(290.0, 1.0));
    // Both columns hold the same rain; only column 1 receives a boundary flux
    state.q[Species::Rain].fill(1e-4);
    let mut out = PrecipitationOutput::new(shape);
    out.surface[Species::Rain][1] = 1e-3;

    graupel_all(&mut state, &mut out, &KernelParams::default()).unwrap();
    assert!(state.q[Species::Rain].get(0, 1) > state.q[Species::Rain].get(0, 0));
    assert!(out.surface[Species::Rain][1] > out.surface[Species::Rain][0]);
}

#[test]
fn test_raised_qmin_applies_to_every_phase() {
    let (t, rho) = (280.0, 1.0);
    let shape = GridShape::new(1, 1);
    let mut state = state_with(shape, t, rho, 100.0);
    state.q[Species::Vapor].fill(qsat_rho(t, rho));
    state.q[Species::Cloud].fill(1e-3);
    state.q[Species::Snow].fill(1e-9);
    let mut out = PrecipitationOutput::new(shape);

    let params = KernelParams {
        thresholds: FilterThresholds {
            qmin: 1e-6,
            ..FilterThresholds::default()
        },
        ..KernelParams::default()
    };
    let stats = graupel_all(&mut state, &mut out, &params).unwrap();
    assert_eq!(stats.active_cells, 1);
    // Snow below the raised threshold neither melts nor sediments
    assert_eq!(stats.sedimented_columns, 0);
    assert_eq!(state.q[Species::Snow].get(0, 0), 1e-9);
    assert!(state.q[Species::Cloud].get(0, 0) < 1e-3);
}

#[test]
fn test_invalid_calls_leave_state_alone() {
    let shape = GridShape::new(3, 2);
    let mut state = state_with(shape, 280.0, 1.0, 100.0);
    state.q[Species::Rain].fill(1e-4);
    let before = state.clone();
    let mut out = PrecipitationOutput::new(shape);

    let params = KernelParams::default();
    assert!(matches!(
        graupel(&mut state, &mut out, &params, 0..3),
        Err(GridError::ColumnRange { .. })
    ));
    assert!(matches!(
        graupel(&mut state, &mut out, &params, 1..1),
        Err(GridError::ColumnRange { .. })
    ));

    let mut short = PrecipitationOutput::new(GridShape::new(3, 1));
    assert!(graupel_all(&mut state, &mut short, &params).is_err());
    assert_eq!(state, before);
}
