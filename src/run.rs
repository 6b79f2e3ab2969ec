use std::path::PathBuf;

use glam::DVec2;
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use thiserror::Error;
use wake_io::{
    decode::{DecodingError, FluidDataDecoder},
    encode::{EncodingError, FluidDataEncoder},
};
use wake_lbm::{
    scene::{ObstacleShape, Scene},
    LbmError,
};

/// Obstacle shapes selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Shape {
    Triangle,
    Circle,
    None,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub width: usize,
    pub height: usize,
    pub reference_density: f64,
    pub tau: f64,
    pub steps: u64,
    pub seed: u64,
    pub shape: Shape,
    /// Obstacle centre; defaults to a quarter of the width and half the height.
    pub center: Option<DVec2>,
    /// Triangle side or circle diameter; defaults to half the height.
    pub size: Option<f64>,
    /// Rotation of the obstacle about its centre, in degrees.
    pub rotation: f64,
    /// Export a frame every `every` steps.
    pub every: u32,
    /// Directory receiving the frames, or `None` to skip export.
    pub output: Option<PathBuf>,
    pub stop_on_instability: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 100,
            reference_density: 1.0,
            tau: 0.8,
            steps: 5000,
            seed: 42,
            shape: Shape::Triangle,
            center: None,
            size: None,
            rotation: -90.0,
            every: 10,
            output: Some(PathBuf::from("lbm_frames")),
            stop_on_instability: false,
        }
    }
}

impl RunConfig {
    fn obstacle(&self) -> ObstacleShape {
        let center = self.center.unwrap_or(DVec2::new(self.width as f64 / 4.0, self.height as f64 / 2.0));
        let size = self.size.unwrap_or(self.height as f64 / 2.0);

        match self.shape {
            Shape::Triangle => ObstacleShape::Triangle { center, side: size },
            Shape::Circle => ObstacleShape::Circle { center, radius: size / 2.0 },
            Shape::None => ObstacleShape::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub frames: u64,
    /// First step after which a fluid cell had lost positive density.
    pub first_unstable_step: Option<u64>,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Lbm(#[from] LbmError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Decoding(#[from] DecodingError),
    #[error(transparent)]
    Template(#[from] indicatif::style::TemplateError),
    #[error("frame interval must be positive")]
    FrameInterval,
}

pub fn run(config: &RunConfig) -> Result<RunSummary, RunError> {
    if config.every == 0 {
        return Err(RunError::FrameInterval);
    }

    let mut scene = Scene::builder()
        .width(config.width)
        .height(config.height)
        .reference_density(config.reference_density)
        .tau(config.tau)
        .seed(config.seed)
        .obstacle(config.obstacle())
        .rotation(config.rotation.to_radians())
        .build()?;

    let num_frames = config.steps.div_ceil(config.every as u64);
    let mut encoder = match &config.output {
        Some(path) => {
            let mut encoder = FluidDataEncoder::new(path.clone(), num_frames, config.every)?;
            encoder.encode_metadata(&scene)?;
            log::info!("writing {num_frames} frames to {}", path.display());
            Some(encoder)
        }
        None => None,
    };

    let bar_template = "Running Simulation {spinner:.green} [{elapsed}] [{bar:50.white/white}] {pos}/{len} ({eta})";
    let style = ProgressStyle::with_template(bar_template)?
        .progress_chars("=> ").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress = ProgressBar::new(config.steps).with_style(style);

    let mut first_unstable_step = None;

    for _ in (0..config.steps).progress_with(progress) {
        let report = scene.step();

        if !report.is_stable() && first_unstable_step.is_none() {
            first_unstable_step = Some(report.step);
            if config.stop_on_instability {
                log::error!("stopping after step {}: the simulation became unstable", report.step);
                break;
            }
        }

        if (report.step - 1) % config.every as u64 == 0 {
            let snapshot = scene.snapshot();
            log::debug!("{}", snapshot.stats());

            if let Some(encoder) = encoder.as_mut() {
                encoder.encode_frame(&snapshot)?;
            }
        }
    }

    let frames = match encoder {
        Some(encoder) => encoder.finish()?,
        None => 0,
    };

    let summary = RunSummary {
        steps: scene.steps(),
        frames,
        first_unstable_step,
    };

    log::info!("{}", scene.snapshot().stats());
    log::info!("simulation complete: {} steps, {} frames written", summary.steps, summary.frames);

    Ok(summary)
}

/// Prints the metadata and per-frame ranges of an exported run.
pub fn inspect(path: PathBuf) -> Result<(), RunError> {
    let mut decoder = FluidDataDecoder::new(path);
    let meta = decoder.decode_metadata()?;

    println!(
        "{}×{} lattice, tau {}, mean density {}, {} solid cells",
        meta.width,
        meta.height,
        meta.tau,
        meta.mean_density,
        meta.mask.solid_count(),
    );
    println!("{} frames, one every {} steps", meta.num_frames, meta.frame_interval);

    while let Some(frame) = decoder.decode_frame()? {
        let (rho_min, rho_max) = range(frame.density()?.iter().copied());
        let (w_min, w_max) = range(frame.vorticity()?.iter().copied());

        println!(
            "step {:>6}: density [{rho_min:.4}, {rho_max:.4}], vorticity [{w_min:.4}, {w_max:.4}]",
            frame.step,
        );
    }

    Ok(())
}

/// Minimum and maximum of the non-`NaN` values.
fn range(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values
        .filter(|v| !v.is_nan())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)))
}
