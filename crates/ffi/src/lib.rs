//! C ABI for the graupel microphysics kernel
//!
//! Fields are caller-owned contiguous `double` buffers in row-major order
//! (`level * columns + column`, level 0 at the top). The kernel works on
//! copies and writes the results back only when the call succeeds, so a
//! failed call leaves every buffer untouched.

mod error;
mod helpers;

pub use error::{muphys_get_last_error, muphys_get_last_error_code, MuphysErrorCode};

use error::DefaultMuphysError;
use helpers::{clear_last_error, read_buffer, track_error, write_buffer};
use muphys_core::{
    graupel, AtmosphericState, Field2D, GridShape, KernelParams, PrecipArray,
    PrecipitationOutput, Real, Species, SpeciesArray,
};

/// C-compatible kernel parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuphysParams {
    /// Time step (s)
    pub dt: f64,
    /// Cloud droplet number concentration (1/cm³)
    pub qnc: f64,
    /// Sediment through the bottom level (false stops one level short)
    pub rain_out: bool,
    /// First level of the sedimentation sweep
    pub kstart: usize,
}

impl From<&MuphysParams> for KernelParams {
    fn from(params: &MuphysParams) -> Self {
        Self {
            rain_out: params.rain_out,
            kstart: params.kstart,
            ..KernelParams::new(params.dt as Real, params.qnc as Real)
        }
    }
}

/// Default kernel parameters (`dt` = 30 s, `qnc` = 100, rain-out enabled,
/// sweep from level 0).
#[no_mangle]
pub extern "C" fn muphys_default_params() -> MuphysParams {
    let defaults = KernelParams::default();
    MuphysParams {
        dt: f64::from(defaults.dt),
        qnc: f64::from(defaults.qnc),
        rain_out: defaults.rain_out,
        kstart: defaults.kstart,
    }
}

/// Advance columns `[ivstart, ivend)` of a `levels × columns` grid by one
/// time step.
///
/// Temperature and the six species are updated in place. `pflx` receives the
/// precipitation flux profile; `prr`, `pri`, `prs`, `prg` (one value per
/// column) are read as the flux entering the first swept level and receive
/// the surface rates of rain, ice, snow and graupel; `pre` receives the
/// surface energy flux term of columns swept down to the bottom level.
///
/// # Returns
/// `Ok` on success. On failure the error code is returned, the message is
/// available from `muphys_get_last_error()` and no buffer is modified.
///
/// # Safety
/// - `params` must point to a valid `MuphysParams`.
/// - `t`, `rho`, `p`, `dz`, `qv`, `qc`, `qi`, `qr`, `qs`, `qg` and `pflx`
///   must each be valid for `levels * columns` doubles.
/// - `prr`, `pri`, `prs`, `prg` and `pre` must each be valid for `columns`
///   doubles.
/// - Output buffers must not overlap each other.
#[no_mangle]
pub unsafe extern "C" fn muphys_graupel(
    params: *const MuphysParams,
    levels: usize,
    columns: usize,
    ivstart: usize,
    ivend: usize,
    t: *mut f64,
    rho: *const f64,
    p: *const f64,
    dz: *const f64,
    qv: *mut f64,
    qc: *mut f64,
    qi: *mut f64,
    qr: *mut f64,
    qs: *mut f64,
    qg: *mut f64,
    pflx: *mut f64,
    prr: *mut f64,
    pri: *mut f64,
    prs: *mut f64,
    prg: *mut f64,
    pre: *mut f64,
) -> MuphysErrorCode {
    if params.is_null() {
        return track_error(&DefaultMuphysError::null_pointer("params"));
    }
    let params = KernelParams::from(unsafe { &*params });
    if !(params.dt.is_finite() && params.dt > 0.0) {
        return track_error(&DefaultMuphysError::invalid_parameter(format!(
            "dt must be finite and positive, got {}",
            params.dt
        )));
    }

    let Some(cells) = levels.checked_mul(columns).filter(|&n| n > 0) else {
        return track_error(&DefaultMuphysError::invalid_dimensions(format!(
            "grid of {levels} levels by {columns} columns is empty or too large"
        )));
    };
    let shape = GridShape::new(levels, columns);

    let species_ptrs = SpeciesArray([qv, qc, qr, qi, qs, qg]);
    let surface_ptrs = PrecipArray([prr, pri, prs, prg]);

    let inputs = unsafe {
        gather(
            shape,
            cells,
            [t.cast_const(), rho, p, dz, pflx.cast_const(), pre.cast_const()],
            &species_ptrs,
            &surface_ptrs,
        )
    };
    let (mut state, mut out) = match inputs {
        Ok(inputs) => inputs,
        Err(e) => return track_error(&e),
    };

    if let Err(e) = graupel(&mut state, &mut out, &params, ivstart..ivend) {
        return track_error(&DefaultMuphysError::from(e));
    }

    unsafe {
        write_buffer(t, state.temperature.as_slice());
        for species in Species::ALL {
            write_buffer(species_ptrs[species], state.q[species].as_slice());
        }
        write_buffer(pflx, out.pflx.as_slice());
        for species in Species::PRECIPITATING {
            write_buffer(surface_ptrs[species], &out.surface[species]);
        }
        write_buffer(pre, &out.energy);
    }

    clear_last_error();
    MuphysErrorCode::Ok
}

/// Copy every caller buffer into owned kernel fields.
///
/// `grid` holds `t`, `rho`, `p`, `dz`, `pflx`, `pre` in that order.
///
/// # Safety
/// See [`muphys_graupel`].
unsafe fn gather(
    shape: GridShape,
    cells: usize,
    grid: [*const f64; 6],
    species: &SpeciesArray<*mut f64>,
    surface: &PrecipArray<*mut f64>,
) -> Result<(AtmosphericState, PrecipitationOutput), DefaultMuphysError> {
    let [t, rho, p, dz, pflx, pre] = grid;
    let field = |ptr: *const f64, name: &str| -> Result<Field2D, DefaultMuphysError> {
        let values = unsafe { read_buffer(ptr, cells, name)? };
        Ok(Field2D::from_vec(shape, values)?)
    };

    let mut q = SpeciesArray::from_fn(|_| Field2D::new(shape));
    for s in Species::ALL {
        q[s] = field(species[s].cast_const(), s.short_name())?;
    }
    let state = AtmosphericState {
        temperature: field(t, "t")?,
        density: field(rho, "rho")?,
        pressure: field(p, "p")?,
        thickness: field(dz, "dz")?,
        q,
    };

    let mut rates = PrecipArray::from_fn(|_| Vec::new());
    for (s, name) in Species::PRECIPITATING
        .into_iter()
        .zip(["prr", "pri", "prs", "prg"])
    {
        rates[s] = unsafe { read_buffer(surface[s].cast_const(), shape.columns, name)? };
    }
    let out = PrecipitationOutput {
        pflx: field(pflx, "pflx")?,
        surface: rates,
        energy: unsafe { read_buffer(pre, shape.columns, "pre")? },
    };
    Ok((state, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::ptr;

    struct Buffers {
        t: Vec<f64>,
        rho: Vec<f64>,
        p: Vec<f64>,
        dz: Vec<f64>,
        q: [Vec<f64>; 6],
        pflx: Vec<f64>,
        surface: [Vec<f64>; 5],
    }

    impl Buffers {
        fn new(levels: usize, columns: usize) -> Self {
            let cells = levels * columns;
            Self {
                t: vec![285.0; cells],
                rho: vec![1.0; cells],
                p: vec![90_000.0; cells],
                dz: vec![200.0; cells],
                q: std::array::from_fn(|_| vec![0.0; cells]),
                pflx: vec![0.0; cells],
                surface: std::array::from_fn(|_| vec![0.0; columns]),
            }
        }

        fn run(&mut self, params: &MuphysParams, levels: usize, columns: usize) -> MuphysErrorCode {
            let [qv, qc, qi, qr, qs, qg] = &mut self.q;
            let [prr, pri, prs, prg, pre] = &mut self.surface;
            unsafe {
                muphys_graupel(
                    params,
                    levels,
                    columns,
                    0,
                    columns,
                    self.t.as_mut_ptr(),
                    self.rho.as_ptr(),
                    self.p.as_ptr(),
                    self.dz.as_ptr(),
                    qv.as_mut_ptr(),
                    qc.as_mut_ptr(),
                    qi.as_mut_ptr(),
                    qr.as_mut_ptr(),
                    qs.as_mut_ptr(),
                    qg.as_mut_ptr(),
                    self.pflx.as_mut_ptr(),
                    prr.as_mut_ptr(),
                    pri.as_mut_ptr(),
                    prs.as_mut_ptr(),
                    prg.as_mut_ptr(),
                    pre.as_mut_ptr(),
                )
            }
        }
    }

    #[test]
    fn test_default_params() {
        let params = muphys_default_params();
        assert_eq!(params.dt, 30.0);
        assert_eq!(params.qnc, 100.0);
        assert!(params.rain_out);
        assert_eq!(params.kstart, 0);
    }

    #[test]
    fn test_rain_reaches_surface() {
        let (levels, columns) = (4, 3);
        let mut buffers = Buffers::new(levels, columns);
        // qr is the fourth species buffer (qv, qc, qi, qr, ...)
        buffers.q[3].fill(5e-4);

        let code = buffers.run(&muphys_default_params(), levels, columns);
        assert_eq!(code, MuphysErrorCode::Ok);
        assert_eq!(muphys_get_last_error_code(), MuphysErrorCode::Ok);
        assert!(muphys_get_last_error().is_null());
        assert!(buffers.surface[0].iter().all(|&rate| rate > 0.0));
        assert!(buffers.pflx.iter().all(|&f| f >= 0.0));
    }

    #[test]
    fn test_null_buffer_reports_name() {
        let params = muphys_default_params();
        let mut t = vec![280.0; 2];
        let code = unsafe {
            muphys_graupel(
                &params,
                1,
                2,
                0,
                2,
                t.as_mut_ptr(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        assert_eq!(code, MuphysErrorCode::NullPointer);
        assert_eq!(muphys_get_last_error_code(), MuphysErrorCode::NullPointer);
        let message = unsafe { CStr::from_ptr(muphys_get_last_error()) };
        assert!(message.to_str().unwrap().contains("'qv'"));
        assert_eq!(t, vec![280.0; 2]);
    }

    #[test]
    fn test_invalid_calls() {
        let mut buffers = Buffers::new(2, 2);
        buffers.q[3].fill(1e-4);
        let before = buffers.q[3].clone();

        let mut params = muphys_default_params();
        params.dt = -1.0;
        assert_eq!(buffers.run(&params, 2, 2), MuphysErrorCode::InvalidParameter);

        let params = muphys_default_params();
        assert_eq!(buffers.run(&params, 0, 2), MuphysErrorCode::InvalidDimensions);
        assert_eq!(buffers.q[3], before);

        let code = unsafe {
            muphys_graupel(
                ptr::null(),
                2,
                2,
                0,
                2,
                ptr::null_mut(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        assert_eq!(code, MuphysErrorCode::NullPointer);
    }
}
