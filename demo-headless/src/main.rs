use clap::Parser;
use muphys_core::io::{create_sink, open_source, read_coordinates, read_fields, write_fields};
use muphys_core::solver::FrameTimer;
use muphys_core::{graupel_all, KernelParams, PrecipitationOutput, Real};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Single-moment graupel microphysics driver
#[derive(Parser, Debug)]
#[command(name = "graupel")]
#[command(about = "Run the graupel microphysics kernel on a gridded input file", long_about = None)]
struct Args {
    /// Input file (.nc or .json)
    #[arg(default_value = "aes-new-gr_moderate-dt30s_atm_3d_ml_20080801T000000Z.nc")]
    input_file: PathBuf,

    /// Output file (.nc or .json)
    #[arg(default_value = "output.nc")]
    output_file: PathBuf,

    /// Time step of the input file to read
    #[arg(default_value_t = 0)]
    time_index: usize,

    /// Model time step in seconds
    #[arg(default_value_t = 30.0)]
    dt: Real,

    /// Cloud droplet number concentration
    #[arg(default_value_t = 100.0)]
    qnc: Real,

    /// Number of kernel calls to time
    #[arg(long, env = "MULTI_GRAUPEL", default_value_t = 1)]
    multirun: usize,

    /// Copy the input's coordinate variables and field attributes to the output
    #[arg(long)]
    copy_coordinates: bool,

    /// Worker threads (defaults to the number of logical cores)
    #[arg(short, long)]
    threads: Option<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("graupel: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    println!("input file: {}", args.input_file.display());
    println!("output file: {}", args.output_file.display());
    println!("itime: {}", args.time_index);
    println!("dt: {}", args.dt);
    println!("qnc: {}", args.qnc);

    let params = KernelParams::new(args.dt, args.qnc);
    if !(params.dt.is_finite() && params.dt > 0.0) {
        return Err(format!("dt must be finite and positive, got {}", params.dt).into());
    }

    let source = open_source(&args.input_file)?;
    let inputs = read_fields(source.as_ref(), args.time_index)?;
    let coordinates = if args.copy_coordinates {
        Some(read_coordinates(source.as_ref())?)
    } else {
        None
    };
    drop(source);

    let mut state = inputs.state;
    let shape = state.shape();
    let mut out = PrecipitationOutput::new(shape);

    println!("multirun = {}", args.multirun);
    let mut timer = FrameTimer::new();
    let start = Instant::now();
    for _ in 0..args.multirun {
        let call = Instant::now();
        let stats = graupel_all(&mut state, &mut out, &params)?;
        timer.record(call.elapsed().as_secs_f64() * 1000.0);
        info!(
            active_cells = stats.active_cells,
            sedimented_columns = stats.sedimented_columns,
            elapsed_ms = timer.last_ms(),
            "kernel call finished"
        );
    }
    let elapsed = start.elapsed();

    let mut sink = create_sink(&args.output_file)?;
    write_fields(sink.as_mut(), &state, &out, coordinates.as_ref())?;

    if timer.calls() > 1 {
        info!(
            calls = timer.calls(),
            mean_ms = timer.mean_ms(),
            total_ms = timer.total_ms(),
            "benchmark summary"
        );
    }
    println!("time taken : {} milliseconds", elapsed.as_millis());
    Ok(())
}
