use std::f64::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use glam::DVec2;
use wake_lbm::{
    bgk::{BgkFluid, BgkParams},
    field::DistributionField,
    obstacle::{polygon::Polygon, ObstacleMask},
    scene::{ObstacleShape, Scene},
    Fluid,
};

const WIDTH: usize = 400;
const HEIGHT: usize = 100;

fn triangle_scene() -> Scene<BgkFluid, BgkParams> {
    Scene::builder()
        .width(WIDTH)
        .height(HEIGHT)
        .tau(0.8)
        .reference_density(1.0)
        .seed(42)
        .obstacle(ObstacleShape::Triangle { center: DVec2::new(100.0, 50.0), side: 50.0 })
        .rotation(-FRAC_PI_2)
        .build()
        .unwrap()
}

#[test]
fn one_step_past_rotated_triangle() {
    let mut scene = triangle_scene();
    let mask = scene.mask().clone();

    // Spot checks on the rotated triangle: apex towards -x, base at x ≈ 128.9.
    assert!(mask.is_solid(50, 100));
    assert!(mask.is_solid(50, 90));
    assert!(mask.is_solid(50, 128));
    assert!(!mask.is_solid(50, 84));
    assert!(!mask.is_solid(50, 130));
    assert!(!mask.is_solid(0, 0));
    assert!(!mask.is_solid(10, 110));
    assert_eq!(mask.regions(), 1);
    assert_eq!(mask.fluid_regions(), 1);

    let area = 3f64.sqrt() / 4.0 * 50.0 * 50.0;
    let solid = mask.solid_count() as f64;
    assert!((solid - area).abs() < 0.1 * area, "{solid} solid cells for area {area}");

    let report = scene.step();
    assert_eq!(report.step, 1);
    assert!(report.is_stable());

    let snapshot = scene.snapshot();
    for ((y, x), &rho) in snapshot.rho.indexed_iter() {
        if !mask.is_solid(y, x) {
            assert!(rho.is_finite() && rho > 0.0, "rho {rho} at ({y}, {x})");
        }
    }

    let stats = snapshot.stats();
    assert!(stats.is_stable());
    assert_relative_eq!(stats.total_mass, (WIDTH * HEIGHT) as f64, max_relative = 1e-10);
}

#[test]
fn mask_matches_polygon_rasterisation() {
    let scene = triangle_scene();
    let triangle = Polygon::equilateral_triangle(DVec2::new(100.0, 50.0), 50.0)
        .unwrap()
        .rotated(-FRAC_PI_2);

    let mask = ObstacleMask::from_obstacle(WIDTH, HEIGHT, &triangle).unwrap();
    assert_eq!(scene.mask(), &mask);

    let unrotated = Polygon::equilateral_triangle(DVec2::new(100.0, 50.0), 50.0).unwrap();
    let about_center =
        ObstacleMask::build_about(WIDTH, HEIGHT, unrotated.vertices(), DVec2::new(100.0, 50.0), -FRAC_PI_2)
            .unwrap();
    assert_eq!(&about_center, scene.mask());

    // Without a centre the vertices turn about their average, which sits h/3 below (100, 50).
    let about_average = ObstacleMask::build(WIDTH, HEIGHT, unrotated.vertices(), -FRAC_PI_2).unwrap();
    assert_ne!(&about_average, scene.mask());
    assert_eq!(
        ObstacleMask::build(WIDTH, HEIGHT, unrotated.vertices(), 0.0).unwrap(),
        ObstacleMask::from_obstacle(WIDTH, HEIGHT, &unrotated).unwrap(),
    );
}

#[test]
fn runs_are_reproducible() {
    let mut a = triangle_scene();
    let mut b = triangle_scene();

    for _ in 0..10 {
        a.step();
        b.step();
    }

    assert_eq!(a.fluid.field(), b.fluid.field());
}

#[test]
fn mass_is_conserved_over_many_steps() {
    let mut scene = Scene::builder().width(120).height(40).build().unwrap();
    let mass = scene.fluid.field().total_mass();

    for _ in 0..50 {
        assert!(scene.step().is_stable());
    }

    assert_relative_eq!(scene.fluid.field().total_mass(), mass, max_relative = 1e-9);
}

#[test]
fn flow_develops_vorticity_behind_obstacle() {
    let mut scene = Scene::builder().width(120).height(40).build().unwrap();

    for _ in 0..100 {
        scene.step();
    }

    let stats = scene.snapshot().stats();
    assert!(stats.is_stable());
    assert!(stats.max_vorticity > 0.0 && stats.min_vorticity < 0.0, "{stats}");
    assert!(stats.max_speed < 0.3, "{stats}");
}

#[test]
fn streaming_alone_conserves_mass() {
    let src = DistributionField::initialize(WIDTH, HEIGHT, 1.0, 42).unwrap();
    let mut dst = src.clone();

    wake_lbm::bgk::stream(&src, &mut dst);

    assert_relative_eq!(dst.total_mass(), src.total_mass(), max_relative = 1e-12);
}

#[test]
fn unstable_relaxation_is_reported_not_clamped() {
    let mut scene = Scene::builder().width(60).height(30).tau(0.5).build().unwrap();

    assert_eq!(scene.params().tau, 0.5);
    // Over-relaxed but not yet diverged after a single step.
    assert!(scene.step().is_stable());
}
