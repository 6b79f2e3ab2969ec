use std::{fs::File, io::{BufRead, BufReader, Read}, path::PathBuf};

use glam::Vec2;
use ndarray::Array2;
use smallvec::SmallVec;
use thiserror::Error;
use wake_lbm::obstacle::ObstacleMask;

use crate::{as_bytes::AsBytes, frame_path, META_FILE};

pub struct FluidDataDecoder {
    /// The path to the directory in which the fluid data resides.
    path: PathBuf,
    width: usize,
    height: usize,
    num_frames: u64,
    current_frame: u64,
}

impl FluidDataDecoder {
    pub fn new(path: PathBuf) -> FluidDataDecoder {
        Self {
            path,
            width: 0,
            height: 0,
            num_frames: 0,
            current_frame: 0,
        }
    }

    fn read_value<const N: usize, T: AsBytes<N>, R: Read>(reader: &mut R) -> Result<T, DecodingError> {
        let mut bytes = [0; N];
        reader.read_exact(&mut bytes)?;

        Ok(T::from_bytes(bytes))
    }

    fn read_values<const N: usize, T: AsBytes<N>, R: Read>(reader: &mut R, count: usize) -> Result<Vec<T>, DecodingError> {
        let mut bytes = vec![0; N * count];
        reader.read_exact(&mut bytes)?;

        Ok(bytes
            .chunks_exact(N)
            .map(|b| {
                let mut value = [0; N];
                value.copy_from_slice(b);
                T::from_bytes(value)
            })
            .collect())
    }

    pub fn decode_metadata(&mut self) -> Result<FluidMetadata, DecodingError> {
        let path = self.path.join(META_FILE);
        let mut reader = BufReader::new(File::open(path)?);

        let width = Self::read_value::<4, u32, _>(&mut reader)? as usize;
        let height = Self::read_value::<4, u32, _>(&mut reader)? as usize;
        let num_frames = Self::read_value::<8, u64, _>(&mut reader)?;
        let frame_interval = Self::read_value::<4, u32, _>(&mut reader)?;
        let tau = Self::read_value::<4, f32, _>(&mut reader)?;
        let mean_density = Self::read_value::<4, f32, _>(&mut reader)?;

        let mut cells = Vec::new();
        reader.read_to_end(&mut cells)?;
        if width.checked_mul(height) != Some(cells.len()) {
            return Err(DecodingError::Format(format!(
                "mask of {} cells does not match a {width}×{height} lattice",
                cells.len(),
            )));
        }
        let cells = Array2::from_shape_vec((height, width), cells.into_iter().map(|c| c != 0).collect())
            .map_err(|e| DecodingError::Format(e.to_string()))?;
        let mask = ObstacleMask::from_cells(cells).map_err(|e| DecodingError::Format(e.to_string()))?;

        self.width = width;
        self.height = height;
        self.num_frames = num_frames;
        self.current_frame = 0;

        Ok(FluidMetadata {
            width,
            height,
            num_frames,
            frame_interval,
            tau,
            mean_density,
            mask,
        })
    }

    /// Reads the next frame, or `None` once every frame has been read. Metadata must be decoded
    /// first.
    pub fn decode_frame(&mut self) -> Result<Option<FluidFrameData>, DecodingError> {
        if self.current_frame >= self.num_frames {
            return Ok(None)
        }

        let path = frame_path(&self.path, self.num_frames, self.current_frame);
        let mut reader = BufReader::new(File::open(path)?);

        let step = Self::read_value::<8, u64, _>(&mut reader)?;
        let cells = self.width * self.height;
        let mut sections = SmallVec::new();

        while !reader.fill_buf()?.is_empty() {
            let len = Self::read_value::<8, u64, _>(&mut reader)?;
            let components = Self::read_value::<1, u8, _>(&mut reader)? as usize;
            if components == 0 {
                return Err(DecodingError::Format("section with zero components".to_string()));
            }
            if len != cells as u64 {
                return Err(DecodingError::Format(format!("section holds {len} values for {cells} cells")));
            }

            let values = Self::read_values::<4, f32, _>(&mut reader, cells * components)?;
            sections.push(FluidDataArray { components, values });
        }

        self.current_frame += 1;

        Ok(Some(FluidFrameData {
            step,
            width: self.width,
            height: self.height,
            sections,
        }))
    }

    pub fn reset(&mut self) {
        self.current_frame = 0;
    }
}

#[derive(Debug, Clone)]
pub struct FluidMetadata {
    pub width: usize,
    pub height: usize,
    pub num_frames: u64,
    /// Number of time steps between two frames.
    pub frame_interval: u32,
    pub tau: f32,
    /// Mean density of the initial field.
    pub mean_density: f32,
    pub mask: ObstacleMask,
}

/// One exported frame. Sections are, in order, density, velocity and vorticity.
#[derive(Debug, Clone)]
pub struct FluidFrameData {
    pub step: u64,
    width: usize,
    height: usize,
    pub sections: SmallVec<[FluidDataArray; 4]>,
}

impl FluidFrameData {
    pub const DENSITY: usize = 0;
    pub const VELOCITY: usize = 1;
    pub const VORTICITY: usize = 2;

    fn scalar(&self, section: usize) -> Result<Array2<f32>, DecodingError> {
        let array = self.section(section)?;
        if array.components != 1 {
            return Err(DecodingError::Format(format!("section {section} is not scalar")));
        }

        Array2::from_shape_vec((self.height, self.width), array.values.clone())
            .map_err(|e| DecodingError::Format(e.to_string()))
    }

    fn section(&self, section: usize) -> Result<&FluidDataArray, DecodingError> {
        self.sections
            .get(section)
            .ok_or_else(|| DecodingError::Format(format!("frame has no section {section}")))
    }

    pub fn density(&self) -> Result<Array2<f32>, DecodingError> {
        self.scalar(Self::DENSITY)
    }

    pub fn vorticity(&self) -> Result<Array2<f32>, DecodingError> {
        self.scalar(Self::VORTICITY)
    }

    pub fn velocity(&self) -> Result<Array2<Vec2>, DecodingError> {
        let array = self.section(Self::VELOCITY)?;
        if array.components != 2 {
            return Err(DecodingError::Format("velocity section is not two dimensional".to_string()));
        }

        Array2::from_shape_vec((self.height, self.width), array.iter::<2>().map(Vec2::from).collect())
            .map_err(|e| DecodingError::Format(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluidDataArray {
    components: usize,
    values: Vec<f32>,
}

impl FluidDataArray {
    pub fn iter<const D: usize>(&self) -> impl Iterator<Item = [f32; D]> + use<'_, D> {
        self.values.chunks_exact(D).map(|chunk| {
            let mut value = [0.0; D];
            value.copy_from_slice(chunk);
            value
        })
    }
}

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed fluid data: {0}")]
    Format(String),
}
