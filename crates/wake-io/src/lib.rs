use std::{io::Write, path::{Path, PathBuf}};

use encode::{EncodingError, FluidFrameEncoder};
use glam::Vec2;
use wake_lbm::diagnostics::Snapshot;

pub mod encode;
pub mod decode;
pub mod as_bytes;

/// Name of the metadata file inside a run directory.
pub const META_FILE: &str = "_meta";

pub trait EncodeFrame {
    fn encode_state<W: Write>(&self, encoder: &mut FluidFrameEncoder<W>) -> Result<(), EncodingError>;
}

impl EncodeFrame for Snapshot<'_> {
    fn encode_state<W: Write>(&self, encoder: &mut FluidFrameEncoder<W>) -> Result<(), EncodingError> {
        let len = self.width() * self.height();

        encoder.encode_value(self.step)?;
        encoder.encode_section(len, self.rho.iter().map(|&rho| rho as f32))?;
        encoder.encode_section(len, self.ux.iter().zip(&self.uy).map(|(&ux, &uy)| Vec2::new(ux as f32, uy as f32)))?;
        encoder.encode_section(len, self.vorticity.iter().map(|&w| w as f32))?;

        Ok(())
    }
}

/// Zero-padded path of frame `frame` out of `num_frames`, so frames sort lexically.
pub(crate) fn frame_path(dir: &Path, num_frames: u64, frame: u64) -> PathBuf {
    let max_digits = num_frames.saturating_sub(1).checked_ilog10().unwrap_or(0) + 1;
    let digits = frame.checked_ilog10().unwrap_or(0) + 1;
    let zeros = max_digits.saturating_sub(digits);

    dir.join(format!("{}{frame}.dat", "0".repeat(zeros as usize)))
}
