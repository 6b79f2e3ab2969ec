use std::f64::consts::FRAC_PI_2;

use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    bgk::{BgkFluid, BgkParams, StepReport},
    diagnostics::Snapshot,
    error::Result,
    field::{DistributionField, InitParams},
    obstacle::{circle::Circle, polygon::Polygon, Obstacle, ObstacleMask},
    Fluid,
};

pub struct Scene<F, P> {
    /// The fluid for this scene.
    pub fluid: F,
    /// The parameters for this scene's fluid.
    params: P,
    /// Solid cells of the domain.
    mask: ObstacleMask,
}

impl<F: Fluid<Params = P>, P> Scene<F, P> {
    /// Assembles a scene, checking that `mask` covers the same lattice as `fluid`.
    pub fn new(fluid: F, params: P, mask: ObstacleMask) -> Result<Self> {
        mask.check_extent(fluid.field().width(), fluid.field().height())?;

        Ok(Self {
            fluid,
            params,
            mask,
        })
    }

    /// Domain width and height, in cells.
    #[inline(always)]
    pub fn size(&self) -> [usize; 2] {
        [self.mask.width(), self.mask.height()]
    }

    #[inline(always)]
    pub fn params(&self) -> &P {
        &self.params
    }

    #[inline(always)]
    pub fn mask(&self) -> &ObstacleMask {
        &self.mask
    }

    #[inline(always)]
    pub fn steps(&self) -> u64 {
        self.fluid.steps()
    }

    pub fn step(&mut self) -> StepReport {
        self.fluid.step(&self.params, &self.mask)
    }

    /// Density, velocity and vorticity of the fluid as of the last completed step.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::capture(self.fluid.field(), &self.mask, self.fluid.steps())
    }
}

impl Scene<BgkFluid, BgkParams> {
    #[inline(always)]
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }
}

/// Obstacle geometry placed in the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ObstacleShape {
    /// Equilateral triangle with the given centre and side length.
    Triangle { center: DVec2, side: f64 },
    Circle { center: DVec2, radius: f64 },
    /// Arbitrary simple polygon, rotating about its vertex average.
    Polygon(Vec<DVec2>),
    /// No obstacle; a fully periodic domain.
    None,
}

impl ObstacleShape {
    /// The shape as an inside-test, rotated by `rotation` radians about its centre.
    pub fn obstacle(&self, rotation: f64) -> Result<Option<Box<dyn Obstacle>>> {
        let obstacle: Option<Box<dyn Obstacle>> = match self {
            ObstacleShape::Triangle { center, side } => {
                Some(Box::new(Polygon::equilateral_triangle(*center, *side)?.rotated(rotation)))
            }
            ObstacleShape::Circle { center, radius } => Some(Box::new(Circle::new(*center, *radius)?)),
            ObstacleShape::Polygon(vertices) => Some(Box::new(Polygon::new(vertices.clone())?.rotated(rotation))),
            ObstacleShape::None => None,
        };

        Ok(obstacle)
    }

    /// Rasterises the shape, rotated by `rotation` radians, onto a `width × height` lattice.
    pub fn mask(&self, width: usize, height: usize, rotation: f64) -> Result<ObstacleMask> {
        match self.obstacle(rotation)? {
            Some(obstacle) => ObstacleMask::from_obstacle(width, height, obstacle.as_ref()),
            None => ObstacleMask::empty(width, height),
        }
    }
}

/// Flow past a single obstacle in a periodic channel.
pub struct SceneBuilder {
    width: usize,
    height: usize,
    reference_density: f64,
    tau: f64,
    seed: u64,
    init: InitParams,
    shape: Option<ObstacleShape>,
    rotation: f64,
}

impl SceneBuilder {
    /// Number of cells along x.
    ///
    /// Defaults to `400`.
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Number of cells along y.
    ///
    /// Defaults to `100`.
    pub fn height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    /// Initial density of every cell.
    ///
    /// Defaults to `1.0`.
    pub fn reference_density(mut self, reference_density: f64) -> Self {
        self.reference_density = reference_density;
        self
    }

    /// The BGK relaxation time.
    ///
    /// Defaults to `0.8`.
    pub fn tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Seed of the initial perturbation.
    ///
    /// Defaults to `42`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// How the initial populations are perturbed.
    ///
    /// Defaults to [`InitParams::default`].
    pub fn init(mut self, init: InitParams) -> Self {
        self.init = init;
        self
    }

    /// The obstacle in the channel.
    ///
    /// Defaults to a triangle centred at a quarter of the width and half the height, with a
    /// side of half the height.
    pub fn obstacle(mut self, shape: ObstacleShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Rotation applied to the obstacle about its centre, in radians.
    ///
    /// Defaults to `-π/2`.
    pub fn rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn build(self) -> Result<Scene<BgkFluid, BgkParams>> {
        let params = BgkParams::new(self.tau)?;

        let shape = self.shape.unwrap_or_else(|| ObstacleShape::Triangle {
            center: DVec2::new(self.width as f64 / 4.0, self.height as f64 / 2.0),
            side: self.height as f64 / 2.0,
        });
        let mask = shape.mask(self.width, self.height, self.rotation)?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let field = DistributionField::initialize_with_rng(
            self.width,
            self.height,
            self.reference_density,
            &self.init,
            &mut rng,
        )?;

        log::info!(
            "built {}×{} scene: tau {}, viscosity {:.4}, {} solid cells in {} region(s)",
            self.width,
            self.height,
            params.tau,
            params.viscosity(),
            mask.solid_count(),
            mask.regions(),
        );

        Scene::new(BgkFluid::new(field), params, mask)
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self {
            width: 400,
            height: 100,
            reference_density: 1.0,
            tau: 0.8,
            seed: 42,
            init: InitParams::default(),
            shape: None,
            rotation: -FRAC_PI_2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let scene = Scene::builder().width(80).height(20).build().unwrap();

        assert_eq!(scene.size(), [80, 20]);
        assert_eq!(scene.params().tau, 0.8);
        assert_eq!(scene.steps(), 0);
        assert!(scene.mask().is_solid(10, 20));
        assert!(!scene.mask().is_solid(0, 0));
    }

    #[test]
    fn rejects_mismatched_mask() {
        let fluid = BgkFluid::new(DistributionField::initialize(10, 10, 1.0, 0).unwrap());
        let mask = ObstacleMask::empty(10, 9).unwrap();

        assert!(Scene::new(fluid, BgkParams::default(), mask).is_err());
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Scene::builder().tau(0.0).build().is_err());
        assert!(Scene::builder().reference_density(-1.0).build().is_err());
        assert!(Scene::builder().width(0).build().is_err());
        assert!(Scene::builder()
            .obstacle(ObstacleShape::Circle { center: DVec2::ZERO, radius: -2.0 })
            .build()
            .is_err());
    }

    #[test]
    fn shape_rasterises_like_its_obstacle() {
        let shape = ObstacleShape::Circle { center: DVec2::new(12.0, 6.0), radius: 3.0 };
        let mask = shape.mask(30, 12, 0.0).unwrap();
        let circle = Circle::new(DVec2::new(12.0, 6.0), 3.0).unwrap();

        assert_eq!(mask, ObstacleMask::from_obstacle(30, 12, &circle).unwrap());
        assert!(ObstacleShape::None.obstacle(0.0).unwrap().is_none());
        assert_eq!(ObstacleShape::None.mask(30, 12, 0.0).unwrap().solid_count(), 0);
    }

    #[test]
    fn steps_advance_snapshot() {
        let mut scene = Scene::builder().width(40).height(20).build().unwrap();

        let report = scene.step();
        let snapshot = scene.snapshot();

        assert_eq!(report.step, 1);
        assert_eq!(snapshot.step, 1);
        assert_eq!((snapshot.width(), snapshot.height()), (40, 20));
    }
}
