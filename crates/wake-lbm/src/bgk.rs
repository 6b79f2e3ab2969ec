use std::mem;

use ndarray::{azip, Axis};

use crate::{
    error::{LbmError, Result},
    field::{DistributionField, Moments},
    lattice::{wrap, D2Q9, Q},
    obstacle::ObstacleMask,
    Fluid,
};

/// Parameters of the single relaxation time collision operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BgkParams {
    /// Relaxation time, in time steps.
    ///
    /// Defaults to `0.8`.
    pub tau: f64,
}

impl BgkParams {
    /// Relaxation times at or below this make the kinematic viscosity non-positive.
    pub const STABILITY_FLOOR: f64 = 0.5;

    pub fn new(tau: f64) -> Result<Self> {
        let params = Self { tau };
        params.validate()?;
        Ok(params)
    }

    /// Rejects non-positive relaxation times. Values at or below [`Self::STABILITY_FLOOR`] are
    /// accepted with a warning.
    pub fn validate(&self) -> Result<()> {
        if !(self.tau > 0.0 && self.tau.is_finite()) {
            return Err(LbmError::parameter("tau", format!("relaxation time must be positive, got {}", self.tau)));
        }

        if self.tau <= Self::STABILITY_FLOOR {
            log::warn!(
                "relaxation time {} is at or below {}; the simulation is likely to become unstable",
                self.tau,
                Self::STABILITY_FLOOR,
            );
        }

        Ok(())
    }

    /// Kinematic viscosity in lattice units, `(tau - 1/2) / 3`.
    #[inline]
    pub fn viscosity(&self) -> f64 {
        (self.tau - 0.5) / 3.0
    }
}

impl Default for BgkParams {
    fn default() -> Self {
        Self { tau: 0.8 }
    }
}

/// Outcome of a single time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Number of steps completed, including this one.
    pub step: u64,
    /// Fluid cells whose density was non-positive or non-finite after collision.
    pub unstable_cells: usize,
}

impl StepReport {
    #[inline]
    pub fn is_stable(&self) -> bool {
        self.unstable_cells == 0
    }
}

/// A D2Q9 lattice Boltzmann fluid with BGK collisions and bounce-back obstacles.
#[derive(Debug, Clone)]
pub struct BgkFluid {
    field: DistributionField,
    /// Streaming target, swapped with `field` every step.
    scratch: DistributionField,
    /// Reflected populations of the solid cells, in the mask's solid cell order.
    boundary: Vec<[f64; Q]>,
    moments: Moments,
    steps: u64,
}

impl BgkFluid {
    pub fn new(field: DistributionField) -> Self {
        let scratch = field.clone();
        let moments = Moments::zeros(field.width(), field.height());

        Self {
            field,
            scratch,
            boundary: Vec::new(),
            moments,
            steps: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.field.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.field.height()
    }
}

impl Fluid for BgkFluid {
    type Params = BgkParams;

    fn step(&mut self, params: &Self::Params, mask: &ObstacleMask) -> StepReport {
        assert_eq!(
            (mask.width(), mask.height()),
            (self.width(), self.height()),
            "obstacle mask and fluid differ in extent",
        );

        stream(&self.field, &mut self.scratch);
        mem::swap(&mut self.field, &mut self.scratch);

        capture_boundary(&self.field, mask, &mut self.boundary);
        self.moments.update(&self.field, mask);
        let unstable_cells = collide(&mut self.field, &self.moments, mask, params.tau);
        restore_boundary(&mut self.field, mask, &self.boundary);

        self.steps += 1;

        if unstable_cells > 0 {
            log::warn!("step {}: {unstable_cells} fluid cells lost positive density", self.steps);
        }

        StepReport {
            step: self.steps,
            unstable_cells,
        }
    }

    #[inline]
    fn field(&self) -> &DistributionField {
        &self.field
    }

    #[inline]
    fn steps(&self) -> u64 {
        self.steps
    }
}

/// Moves every population one cell along its lattice velocity, wrapping around the domain
/// edges. `dst` must have the same extent as `src`.
pub fn stream(src: &DistributionField, dst: &mut DistributionField) {
    let src = src.as_array();
    let dst = dst.as_array_mut();
    assert_eq!(src.dim(), dst.dim(), "streaming between fields of different extent");

    let (ny, nx, _) = src.dim();

    for d in 0..Q {
        let (cx, cy) = (D2Q9::CX[d], D2Q9::CY[d]);
        let from = src.index_axis(Axis(2), d);
        let mut to = dst.index_axis_mut(Axis(2), d);

        for y in 0..ny {
            let sy = wrap(y, -cy, ny);
            for x in 0..nx {
                to[(y, x)] = from[(sy, wrap(x, -cx, nx))];
            }
        }
    }
}

/// Records the populations of every solid cell with their directions reversed.
pub fn capture_boundary(field: &DistributionField, mask: &ObstacleMask, boundary: &mut Vec<[f64; Q]>) {
    boundary.clear();
    boundary.extend(mask.solid_cells().iter().map(|&(y, x)| {
        let cell = field.cell(y, x);
        std::array::from_fn(|d| cell[D2Q9::opposite(d)])
    }));
}

/// Writes back populations recorded by [`capture_boundary`] with the same mask.
pub fn restore_boundary(field: &mut DistributionField, mask: &ObstacleMask, boundary: &[[f64; Q]]) {
    debug_assert_eq!(mask.solid_count(), boundary.len());

    let f = field.as_array_mut();
    for (&(y, x), values) in mask.solid_cells().iter().zip(boundary) {
        for (d, &v) in values.iter().enumerate() {
            f[(y, x, d)] = v;
        }
    }
}

/// Relaxes every fluid cell towards its local equilibrium, `f -= (f - feq) / tau`.
///
/// Solid cells are left untouched. Returns the number of fluid cells whose density is
/// non-positive or non-finite afterwards.
pub fn collide(field: &mut DistributionField, moments: &Moments, mask: &ObstacleMask, tau: f64) -> usize {
    let omega = tau.recip();
    let mut unstable = 0;

    azip!((
        mut cell in field.as_array_mut().lanes_mut(Axis(2)),
        &rho in &moments.rho,
        &ux in &moments.ux,
        &uy in &moments.uy,
        &solid in mask.cells()
    ) {
        if !solid {
            let mut mass = 0.0;

            for (d, f) in cell.iter_mut().enumerate() {
                let feq = D2Q9::equilibrium(d, rho, ux, uy);
                *f -= (*f - feq) * omega;
                mass += *f;
            }

            if !(mass > 0.0 && mass.is_finite()) {
                unstable += 1;
            }
        }
    });

    unstable
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::Array2;

    use super::*;

    fn single_solid(width: usize, height: usize, y: usize, x: usize) -> ObstacleMask {
        let mut cells = Array2::from_elem((height, width), false);
        cells[(y, x)] = true;
        ObstacleMask::from_cells(cells).unwrap()
    }

    #[test]
    fn streaming_conserves_mass() {
        let src = DistributionField::initialize(37, 23, 1.0, 42).unwrap();
        let mut dst = src.clone();

        stream(&src, &mut dst);

        assert_relative_eq!(dst.total_mass(), src.total_mass(), max_relative = 1e-12);
        assert_ne!(dst, src);
    }

    #[test]
    fn streaming_moves_along_velocity() {
        let mut src = DistributionField::equilibrium(5, 4, 1.0, 0.0, 0.0).unwrap();
        src.as_array_mut().fill(0.0);
        for d in 0..Q {
            src.as_array_mut()[(1, 2, d)] = d as f64 + 1.0;
        }
        let mut dst = src.clone();

        stream(&src, &mut dst);

        for dir in D2Q9::directions() {
            let y = wrap(1, dir.velocity.y, 4);
            let x = wrap(2, dir.velocity.x, 5);
            assert_eq!(dst.as_array()[(y, x, dir.index)], dir.index as f64 + 1.0);
        }
        assert_relative_eq!(dst.total_mass(), 45.0);
    }

    #[test]
    fn streaming_wraps_around_edges() {
        let mut src = DistributionField::equilibrium(4, 3, 1.0, 0.0, 0.0).unwrap();
        src.as_array_mut().fill(0.0);
        // North-east population in the top-right corner.
        src.as_array_mut()[(2, 3, 2)] = 1.0;
        let mut dst = src.clone();

        stream(&src, &mut dst);

        assert_eq!(dst.as_array()[(0, 0, 2)], 1.0);
        assert_relative_eq!(dst.total_mass(), 1.0);
    }

    #[test]
    fn equilibrium_is_a_fixed_point_of_collision() {
        let mut field = DistributionField::equilibrium(8, 6, 1.0, 0.0, 0.0).unwrap();
        let before = field.clone();
        let mask = ObstacleMask::empty(8, 6).unwrap();
        let moments = Moments::of(&field, &mask);

        let unstable = collide(&mut field, &moments, &mask, 0.8);

        assert_eq!(unstable, 0);
        for (a, b) in field.as_array().iter().zip(before.as_array()) {
            assert_relative_eq!(a, b, epsilon = 1e-15);
        }
    }

    #[test]
    fn collision_conserves_mass_and_momentum() {
        let mut field = DistributionField::initialize(12, 9, 1.0, 3).unwrap();
        let mask = ObstacleMask::empty(12, 9).unwrap();
        let moments = Moments::of(&field, &mask);

        collide(&mut field, &moments, &mask, 0.6);
        let after = Moments::of(&field, &mask);

        for ((a, b), (ua, ub)) in after.rho.iter().zip(&moments.rho).zip(after.ux.iter().zip(&moments.ux)) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
            assert_relative_eq!(ua, ub, epsilon = 1e-12);
        }
    }

    #[test]
    fn bounce_back_reverses_direction() {
        let mask = single_solid(5, 5, 2, 2);

        for d in 1..Q {
            let mut field = DistributionField::equilibrium(5, 5, 1.0, 0.0, 0.0).unwrap();
            field.as_array_mut().fill(0.0);
            field.as_array_mut()[(2, 2, d)] = 0.5;

            let mut boundary = Vec::new();
            capture_boundary(&field, &mask, &mut boundary);
            field.as_array_mut().fill(0.0);
            restore_boundary(&mut field, &mask, &boundary);

            let cell = field.cell(2, 2);
            for (i, &v) in cell.iter().enumerate() {
                let expected = if i == D2Q9::opposite(d) { 0.5 } else { 0.0 };
                assert_eq!(v, expected, "direction {d}, slot {i}");
            }
            assert_eq!(field.total_mass(), 0.5);
        }
    }

    #[test]
    fn solid_cells_skip_collision() {
        let mask = single_solid(4, 4, 1, 1);
        let mut field = DistributionField::initialize(4, 4, 1.0, 9).unwrap();
        let before = field.cell(1, 1).to_owned();
        let moments = Moments::of(&field, &mask);

        collide(&mut field, &moments, &mask, 0.8);

        assert_eq!(field.cell(1, 1), before);
    }

    #[test]
    fn uniform_rest_state_is_steady() {
        let mut fluid = BgkFluid::new(DistributionField::equilibrium(10, 10, 1.0, 0.0, 0.0).unwrap());
        let before = fluid.field().clone();
        let mask = ObstacleMask::empty(10, 10).unwrap();

        for _ in 0..5 {
            assert!(fluid.step(&BgkParams::default(), &mask).is_stable());
        }

        assert_eq!(fluid.steps(), 5);
        for (a, b) in fluid.field().as_array().iter().zip(before.as_array()) {
            assert_relative_eq!(a, b, epsilon = 1e-14);
        }
    }

    #[test]
    fn step_conserves_mass_with_obstacle() {
        let mask = single_solid(16, 12, 6, 8);
        let mut fluid = BgkFluid::new(DistributionField::initialize(16, 12, 1.0, 42).unwrap());
        let mass = fluid.field().total_mass();

        for _ in 0..20 {
            fluid.step(&BgkParams::default(), &mask);
        }

        assert_relative_eq!(fluid.field().total_mass(), mass, max_relative = 1e-10);
    }

    #[test]
    fn reports_collapsed_density() {
        let mask = ObstacleMask::empty(3, 3).unwrap();
        let mut field = DistributionField::equilibrium(3, 3, 1.0, 0.0, 0.0).unwrap();
        field.as_array_mut()[(1, 1, 0)] = -10.0;
        let moments = Moments::of(&field, &mask);

        assert_eq!(collide(&mut field, &moments, &mask, 0.8), 1);
    }

    #[test]
    fn validates_tau() {
        assert!(BgkParams::new(0.8).is_ok());
        assert!(BgkParams::new(0.5).is_ok());
        assert!(matches!(BgkParams::new(0.0), Err(LbmError::InvalidParameter { name: "tau", .. })));
        assert!(matches!(BgkParams::new(-1.0), Err(LbmError::InvalidParameter { name: "tau", .. })));
        assert!(BgkParams::new(f64::NAN).is_err());
        assert_relative_eq!(BgkParams::new(0.8).unwrap().viscosity(), 0.1);
    }

    #[test]
    #[should_panic(expected = "differ in extent")]
    fn step_rejects_mismatched_mask() {
        let mut fluid = BgkFluid::new(DistributionField::equilibrium(8, 6, 1.0, 0.0, 0.0).unwrap());
        let mask = ObstacleMask::empty(6, 8).unwrap();

        fluid.step(&BgkParams::default(), &mask);
    }
}
