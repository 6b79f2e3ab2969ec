use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Seek, SeekFrom, Write},
    path::PathBuf,
};

use thiserror::Error;

use wake_lbm::{bgk::BgkParams, scene::Scene, Fluid};

use crate::{frame_path, EncodeFrame, META_FILE};

use super::as_bytes::AsBytes;

pub struct FluidDataEncoder {
    /// The path to the directory into which the fluid data will be placed.
    path: PathBuf,
    num_frames: u64,
    /// Number of time steps between two frames.
    frame_interval: u32,
    current_frame: u64,
}

impl FluidDataEncoder {
    /// Prepares `path` for a run of `num_frames` frames, creating the directory if needed.
    pub fn new(path: PathBuf, num_frames: u64, frame_interval: u32) -> Result<FluidDataEncoder, EncodingError> {
        std::fs::create_dir_all(&path)?;

        Ok(Self {
            path,
            num_frames,
            frame_interval,
            current_frame: 0,
        })
    }

    #[inline]
    pub fn frames_written(&self) -> u64 {
        self.current_frame
    }

    pub fn encode_metadata<F>(&mut self, scene: &Scene<F, BgkParams>) -> Result<(), EncodingError>
    where
        F: Fluid<Params = BgkParams>,
    {
        let path = self.path.join(META_FILE);
        let mut writer = BufWriter::new(File::create(path)?);

        let [width, height] = scene.size();
        let field = scene.fluid.field();
        let mean_density = field.total_mass() / (width * height) as f64;

        writer.write_all(&(width as u32).to_bytes())?;
        writer.write_all(&(height as u32).to_bytes())?;
        writer.write_all(&self.num_frames.to_bytes())?;
        writer.write_all(&self.frame_interval.to_bytes())?;
        writer.write_all(&(scene.params().tau as f32).to_bytes())?;
        writer.write_all(&(mean_density as f32).to_bytes())?;

        let mask: Vec<u8> = scene.mask().cells().iter().map(|&s| s as u8).collect();
        writer.write_all(&mask)?;
        writer.flush()?;

        Ok(())
    }

    pub fn encode_frame<T: EncodeFrame>(&mut self, frame: &T) -> Result<(), EncodingError> {
        if self.current_frame >= self.num_frames {
            return Err(EncodingError::TooManyFrames(self.num_frames));
        }

        let path = frame_path(&self.path, self.num_frames, self.current_frame);
        let writer = BufWriter::new(File::create(path)?);

        let mut encoder = FluidFrameEncoder { writer };
        frame.encode_state(&mut encoder)?;
        encoder.writer.flush()?;

        log::debug!("wrote frame {}/{} to {}", self.current_frame + 1, self.num_frames, self.path.display());
        self.current_frame += 1;

        Ok(())
    }

    /// Closes the run, shrinking the frame count recorded in the metadata to the frames actually
    /// written. Frames are renamed if the shorter count changes their padding.
    ///
    /// Returns the number of frames written.
    pub fn finish(self) -> Result<u64, EncodingError> {
        if self.current_frame == self.num_frames {
            return Ok(self.current_frame);
        }

        for frame in 0..self.current_frame {
            let from = frame_path(&self.path, self.num_frames, frame);
            let to = frame_path(&self.path, self.current_frame, frame);
            if from != to {
                std::fs::rename(from, to)?;
            }
        }

        // Frame count follows the two u32 extents.
        let mut meta = OpenOptions::new().write(true).open(self.path.join(META_FILE))?;
        meta.seek(SeekFrom::Start(8))?;
        meta.write_all(&self.current_frame.to_bytes())?;
        meta.flush()?;

        log::info!("run ended after {} of {} frames", self.current_frame, self.num_frames);

        Ok(self.current_frame)
    }
}

pub struct FluidFrameEncoder<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> FluidFrameEncoder<W> {
    pub fn encode_value<const N: usize, T: AsBytes<N>>(&mut self, value: T) -> Result<(), EncodingError> {
        self.writer.write_all(&value.to_bytes())?;
        Ok(())
    }

    /// Writes `len` values, preceded by their count and the number of `f32` components in each.
    pub fn encode_section<const N: usize, T, I>(&mut self, len: usize, values: I) -> Result<(), EncodingError>
    where
        I: Iterator<Item = T>,
        T: AsBytes<N>,
    {
        let bytes: Vec<_> = values.flat_map(|v| v.to_bytes()).collect();
        if bytes.len() != len * N {
            return Err(EncodingError::SectionLength { expected: len, actual: bytes.len() / N });
        }

        self.writer.write_all(&(len as u64).to_bytes())?;
        self.writer.write_all(&((N / 4) as u8).to_bytes())?;
        self.writer.write_all(&bytes)?;

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("section declared {expected} values but produced {actual}")]
    SectionLength { expected: usize, actual: usize },
    #[error("all {0} frames have already been written")]
    TooManyFrames(u64),
}
