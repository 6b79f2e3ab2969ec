use bgk::StepReport;
use field::DistributionField;
use obstacle::ObstacleMask;

pub mod bgk;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod lattice;
pub mod obstacle;
pub mod scene;

pub use error::{LbmError, Result};

pub trait Fluid {
    type Params;

    /// Advances the fluid by one time step around the solid cells of `mask`.
    ///
    /// # Panics
    ///
    /// Panics if `mask` does not have the same extent as the fluid. [`Scene`](scene::Scene)
    /// checks this once when it is created.
    fn step(&mut self, params: &Self::Params, mask: &ObstacleMask) -> StepReport;

    fn field(&self) -> &DistributionField;

    /// Number of completed steps.
    fn steps(&self) -> u64;
}
