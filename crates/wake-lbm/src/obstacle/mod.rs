use glam::DVec2;

pub mod circle;
pub mod polygon;
mod mask;

pub use mask::ObstacleMask;

/// A solid region the fluid flows around.
pub trait Obstacle {
    /// Whether the point `p`, in lattice units, lies inside the obstacle. Points on the boundary
    /// count as inside.
    fn contains(&self, p: DVec2) -> bool;
}
