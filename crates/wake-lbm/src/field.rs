use ndarray::{azip, s, Array2, Array3, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::{
    error::{check_extent, LbmError, Result},
    lattice::{D2Q9, Q},
    obstacle::ObstacleMask,
};

/// How a fresh field is seeded before normalisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitParams {
    /// Standard deviation of the Gaussian noise added to every population.
    ///
    /// Defaults to `0.01`.
    pub perturbation: f64,
    /// Constant added to `bias_direction` at every cell.
    ///
    /// Defaults to `0.1`.
    pub bias: f64,
    /// Defaults to [`D2Q9::EAST`].
    pub bias_direction: usize,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            perturbation: 0.01,
            bias: 0.1,
            bias_direction: D2Q9::EAST,
        }
    }
}

/// Particle populations `f[(y, x, d)]` over the whole lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionField {
    f: Array3<f64>,
}

impl DistributionField {
    /// Seeds a `width × height` field from `seed` with the default [`InitParams`], normalised to
    /// `reference_density` in every cell.
    pub fn initialize(width: usize, height: usize, reference_density: f64, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::initialize_with_rng(width, height, reference_density, &InitParams::default(), &mut rng)
    }

    pub fn initialize_with_rng<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        reference_density: f64,
        params: &InitParams,
        rng: &mut R,
    ) -> Result<Self> {
        let (width, height) = check_extent(width, height)?;
        check_density(reference_density)?;
        if params.bias_direction >= Q {
            return Err(LbmError::parameter(
                "bias_direction",
                format!("direction {} does not exist on a {Q} velocity lattice", params.bias_direction),
            ));
        }

        let mut f = Array3::from_shape_simple_fn((height, width, Q), || {
            1.0 + params.perturbation * rng.sample::<f64, _>(StandardNormal)
        });

        let mut plane = f.index_axis_mut(Axis(2), params.bias_direction);
        plane += params.bias;

        for mut cell in f.lanes_mut(Axis(2)) {
            let rho = cell.sum();
            if !(rho > 0.0 && rho.is_finite()) {
                return Err(LbmError::parameter(
                    "perturbation",
                    format!("initial cell density {rho} cannot be normalised"),
                ));
            }
            cell *= reference_density / rho;
        }

        log::debug!("initialised {width}×{height} field at density {reference_density}");

        Ok(Self { f })
    }

    /// A field resting at the local equilibrium of a uniform `rho`, `(ux, uy)` flow.
    pub fn equilibrium(width: usize, height: usize, rho: f64, ux: f64, uy: f64) -> Result<Self> {
        let (width, height) = check_extent(width, height)?;
        check_density(rho)?;

        let f = Array3::from_shape_fn((height, width, Q), |(_, _, d)| D2Q9::equilibrium(d, rho, ux, uy));

        Ok(Self { f })
    }

    /// Wraps an existing `(height, width, 9)` array.
    pub fn from_array(f: Array3<f64>) -> Result<Self> {
        let (height, width, q) = f.dim();
        check_extent(width, height)?;
        if q != Q {
            return Err(LbmError::parameter("field", format!("expected {Q} directions per cell, got {q}")));
        }

        Ok(Self { f })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.f.len_of(Axis(1))
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.f.len_of(Axis(0))
    }

    #[inline]
    pub fn as_array(&self) -> &Array3<f64> {
        &self.f
    }

    #[inline]
    pub fn as_array_mut(&mut self) -> &mut Array3<f64> {
        &mut self.f
    }

    #[inline]
    pub fn cell(&self, y: usize, x: usize) -> ArrayView1<'_, f64> {
        self.f.slice(s![y, x, ..])
    }

    /// Sum of every population in the field.
    pub fn total_mass(&self) -> f64 {
        self.f.sum()
    }

    /// Per-cell density `Σ_d f`.
    pub fn density(&self) -> Array2<f64> {
        self.f.sum_axis(Axis(2))
    }
}

fn check_density(rho: f64) -> Result<()> {
    if !(rho > 0.0 && rho.is_finite()) {
        return Err(LbmError::parameter("reference_density", format!("density must be positive, got {rho}")));
    }

    Ok(())
}

/// Density and velocity of every cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Moments {
    pub rho: Array2<f64>,
    pub ux: Array2<f64>,
    pub uy: Array2<f64>,
}

impl Moments {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            rho: Array2::zeros((height, width)),
            ux: Array2::zeros((height, width)),
            uy: Array2::zeros((height, width)),
        }
    }

    pub fn of(field: &DistributionField, mask: &ObstacleMask) -> Self {
        let mut moments = Self::zeros(field.width(), field.height());
        moments.update(field, mask);
        moments
    }

    /// Recomputes the moments of `field`.
    ///
    /// Density is computed everywhere. Velocity is only computed in fluid cells with positive
    /// density; solid cells and empty cells report zero velocity.
    pub fn update(&mut self, field: &DistributionField, mask: &ObstacleMask) {
        azip!((
            rho in &mut self.rho,
            ux in &mut self.ux,
            uy in &mut self.uy,
            &solid in mask.cells(),
            cell in field.f.lanes(Axis(2))
        ) {
            let mut m0 = 0.0;
            let mut mx = 0.0;
            let mut my = 0.0;

            for (d, &v) in cell.iter().enumerate() {
                m0 += v;
                mx += v * D2Q9::CX[d] as f64;
                my += v * D2Q9::CY[d] as f64;
            }

            *rho = m0;
            if solid || !(m0 > 0.0) {
                *ux = 0.0;
                *uy = 0.0;
            } else {
                *ux = mx / m0;
                *uy = my / m0;
            }
        });
    }
}
