use glam::DVec2;

use crate::error::{LbmError, Result};

use super::Obstacle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub position: DVec2,
    pub radius: f64,
}

impl Circle {
    pub fn new(pos: DVec2, radius: f64) -> Result<Self> {
        if !pos.is_finite() {
            return Err(LbmError::InvalidGeometry(format!("circle centre {pos} is not finite")));
        }
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(LbmError::InvalidGeometry(format!("circle radius must be positive, got {radius}")));
        }

        Ok(Circle {
            position: pos,
            radius,
        })
    }
}

impl Obstacle for Circle {
    fn contains(&self, p: DVec2) -> bool {
        p.distance_squared(self.position) <= self.radius * self.radius
    }
}
