//! Macroscopic fields derived from the populations, for visualisation and export.

use std::fmt;

use ndarray::{azip, Array2};

use crate::{
    field::{DistributionField, Moments},
    lattice::wrap,
    obstacle::ObstacleMask,
};

/// Fluid state after a completed step.
///
/// Velocity is zero inside the obstacle and vorticity is `NaN` there.
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub step: u64,
    pub rho: Array2<f64>,
    pub ux: Array2<f64>,
    pub uy: Array2<f64>,
    pub vorticity: Array2<f64>,
    pub mask: &'a ObstacleMask,
}

impl<'a> Snapshot<'a> {
    pub fn capture(field: &DistributionField, mask: &'a ObstacleMask, step: u64) -> Self {
        let Moments { rho, ux, uy } = Moments::of(field, mask);
        let vorticity = vorticity(&ux, &uy, mask);

        Self {
            step,
            rho,
            ux,
            uy,
            vorticity,
            mask,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.rho.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rho.nrows()
    }

    pub fn stats(&self) -> FieldStats {
        let mut stats = FieldStats {
            step: self.step,
            total_mass: self.rho.sum(),
            min_density: f64::INFINITY,
            max_density: f64::NEG_INFINITY,
            max_speed: 0.0,
            min_vorticity: f64::INFINITY,
            max_vorticity: f64::NEG_INFINITY,
            unstable_cells: 0,
        };

        azip!((
            &rho in &self.rho,
            &ux in &self.ux,
            &uy in &self.uy,
            &w in &self.vorticity,
            &solid in self.mask.cells()
        ) {
            if !solid {
                if !(rho > 0.0 && rho.is_finite()) {
                    stats.unstable_cells += 1;
                }
                stats.min_density = stats.min_density.min(rho);
                stats.max_density = stats.max_density.max(rho);
                stats.max_speed = stats.max_speed.max(ux.hypot(uy));
                stats.min_vorticity = stats.min_vorticity.min(w);
                stats.max_vorticity = stats.max_vorticity.max(w);
            }
        });

        stats
    }
}

/// Centred difference curl of the velocity field with periodic wraparound:
/// `(ux[y+1, x] - ux[y-1, x]) - (uy[y, x+1] - uy[y, x-1])`.
///
/// Solid cells are `NaN`.
pub fn vorticity(ux: &Array2<f64>, uy: &Array2<f64>, mask: &ObstacleMask) -> Array2<f64> {
    let (ny, nx) = ux.dim();

    Array2::from_shape_fn((ny, nx), |(y, x)| {
        if mask.is_solid(y, x) {
            return f64::NAN;
        }

        (ux[(wrap(y, 1, ny), x)] - ux[(wrap(y, -1, ny), x)])
            - (uy[(y, wrap(x, 1, nx))] - uy[(y, wrap(x, -1, nx))])
    })
}

/// Summary of a [`Snapshot`] over the fluid cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub step: u64,
    /// Density summed over every cell, solid cells included.
    pub total_mass: f64,
    pub min_density: f64,
    pub max_density: f64,
    pub max_speed: f64,
    pub min_vorticity: f64,
    pub max_vorticity: f64,
    /// Fluid cells with non-positive or non-finite density.
    pub unstable_cells: usize,
}

impl FieldStats {
    #[inline]
    pub fn is_stable(&self) -> bool {
        self.unstable_cells == 0
    }
}

impl fmt::Display for FieldStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {}: mass {:.6}, density [{:.4}, {:.4}], max speed {:.4}, vorticity [{:.4}, {:.4}]",
            self.step,
            self.total_mass,
            self.min_density,
            self.max_density,
            self.max_speed,
            self.min_vorticity,
            self.max_vorticity,
        )
    }
}
