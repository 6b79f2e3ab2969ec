use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use glam::DVec2;
use run::{RunConfig, Shape};

mod run;

/// Lattice Boltzmann flow past an obstacle.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a simulation and export frames.
    Run(RunArgs),
    /// Summarise an exported run.
    Inspect {
        /// Directory written by `run`.
        path: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Lattice cells along x.
    #[arg(long, default_value_t = 400)]
    width: usize,
    /// Lattice cells along y.
    #[arg(long, default_value_t = 100)]
    height: usize,
    /// Initial density of every cell.
    #[arg(long, default_value_t = 1.0)]
    density: f64,
    /// BGK relaxation time.
    #[arg(long, default_value_t = 0.8)]
    tau: f64,
    /// Number of time steps.
    #[arg(long, default_value_t = 5000)]
    steps: u64,
    /// Seed of the initial perturbation.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, value_enum, default_value_t = Shape::Triangle)]
    shape: Shape,
    /// Obstacle centre along x [default: width / 4].
    #[arg(long, requires = "center_y")]
    center_x: Option<f64>,
    /// Obstacle centre along y [default: height / 2].
    #[arg(long, requires = "center_x")]
    center_y: Option<f64>,
    /// Triangle side or circle diameter [default: height / 2].
    #[arg(long)]
    size: Option<f64>,
    /// Obstacle rotation about its centre, in degrees.
    #[arg(long, default_value_t = -90.0, allow_negative_numbers = true)]
    rotation: f64,
    /// Export a frame every N steps.
    #[arg(long, default_value_t = 10)]
    every: u32,
    /// Directory receiving the exported frames.
    #[arg(short, long, default_value = "lbm_frames")]
    output: PathBuf,
    /// Run without exporting frames.
    #[arg(long)]
    no_export: bool,
    /// Stop at the first step that leaves a fluid cell without positive density.
    #[arg(long)]
    stop_on_instability: bool,
}

impl From<RunArgs> for RunConfig {
    fn from(args: RunArgs) -> Self {
        RunConfig {
            width: args.width,
            height: args.height,
            reference_density: args.density,
            tau: args.tau,
            steps: args.steps,
            seed: args.seed,
            shape: args.shape,
            center: args.center_x.zip(args.center_y).map(|(x, y)| DVec2::new(x, y)),
            size: args.size,
            rotation: args.rotation,
            every: args.every,
            output: (!args.no_export).then_some(args.output),
            stop_on_instability: args.stop_on_instability,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run::run(&args.into()).map(|summary| {
            if let Some(step) = summary.first_unstable_step {
                log::warn!("the simulation became unstable at step {step}; consider a larger tau");
            }
        }),
        Command::Inspect { path } => run::inspect(path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
