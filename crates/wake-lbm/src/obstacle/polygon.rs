use glam::DVec2;

use crate::error::{LbmError, Result};

use super::Obstacle;

/// A simple polygon given by its ordered vertices.
///
/// Every polygon carries the centre it rotates about. For a polygon built from a bare vertex
/// list this is the vertex average; shape constructors such as
/// [`Polygon::equilateral_triangle`] use the centre they were given instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<DVec2>,
    center: DVec2,
}

impl Polygon {
    pub fn new(vertices: Vec<DVec2>) -> Result<Self> {
        let center = vertices.iter().copied().sum::<DVec2>() / vertices.len().max(1) as f64;
        Self::with_center(vertices, center)
    }

    /// Creates a polygon that rotates about `center`.
    pub fn with_center(vertices: Vec<DVec2>, center: DVec2) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(LbmError::InvalidGeometry(format!(
                "a polygon needs at least 3 vertices, got {}",
                vertices.len(),
            )));
        }
        if let Some(v) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(LbmError::InvalidGeometry(format!("vertex {v} is not finite")));
        }
        if !center.is_finite() {
            return Err(LbmError::InvalidGeometry(format!("centre {center} is not finite")));
        }

        let polygon = Polygon { vertices, center };

        let (min, max) = polygon.bounds();
        let extent = (max - min).max_element();
        if polygon.signed_area().abs() <= f64::EPSILON * extent * extent {
            return Err(LbmError::InvalidGeometry("polygon has zero area".to_string()));
        }

        Ok(polygon)
    }

    /// An equilateral triangle pointing towards -y, centred on `center`.
    ///
    /// The apex sits a third of the triangle's height below `center` and the base two thirds
    /// above it.
    pub fn equilateral_triangle(center: DVec2, side: f64) -> Result<Self> {
        if !(side > 0.0 && side.is_finite()) {
            return Err(LbmError::InvalidGeometry(format!("side length must be positive, got {side}")));
        }

        let height = 3f64.sqrt() / 2.0 * side;
        let vertices = vec![
            DVec2::new(center.x, center.y - height / 3.0),
            DVec2::new(center.x - side / 2.0, center.y + height * 2.0 / 3.0),
            DVec2::new(center.x + side / 2.0, center.y + height * 2.0 / 3.0),
        ];

        Self::with_center(vertices, center)
    }

    #[inline]
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Shoelace area, positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        let twice: f64 = (0..n)
            .map(|i| self.vertices[i].perp_dot(self.vertices[(i + 1) % n]))
            .sum();

        twice / 2.0
    }

    pub fn bounds(&self) -> (DVec2, DVec2) {
        self.vertices.iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(min, max), &v| (min.min(v), max.max(v)),
        )
    }

    /// Rigidly rotates the vertices by `angle` radians (counter-clockwise for positive angles)
    /// about the polygon's centre.
    pub fn rotated(&self, angle: f64) -> Polygon {
        let rotation = DVec2::from_angle(angle);
        let vertices = self.vertices
            .iter()
            .map(|&v| rotation.rotate(v - self.center) + self.center)
            .collect();

        Polygon {
            vertices,
            center: self.center,
        }
    }
}

impl Obstacle for Polygon {
    fn contains(&self, p: DVec2) -> bool {
        match self.vertices.as_slice() {
            &[v1, v2, v3] => barycentric(p, v1, v2, v3).is_some_and(|[a, b, c]| a >= 0.0 && b >= 0.0 && c >= 0.0),
            vertices => contains_even_odd(vertices, p),
        }
    }
}

/// Barycentric coordinates of `p` with respect to the triangle `v1 v2 v3`, or `None` if the
/// triangle is degenerate.
pub fn barycentric(p: DVec2, v1: DVec2, v2: DVec2, v3: DVec2) -> Option<[f64; 3]> {
    let denom = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);
    if denom == 0.0 {
        return None;
    }

    let a = ((v2.y - v3.y) * (p.x - v3.x) + (v3.x - v2.x) * (p.y - v3.y)) / denom;
    let b = ((v3.y - v1.y) * (p.x - v3.x) + (v1.x - v3.x) * (p.y - v3.y)) / denom;

    Some([a, b, 1.0 - a - b])
}

fn contains_even_odd(vertices: &[DVec2], p: DVec2) -> bool {
    let n = vertices.len();
    let mut inside = false;

    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];

        if on_segment(p, a, b) {
            return true;
        }

        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }

    inside
}

fn on_segment(p: DVec2, a: DVec2, b: DVec2) -> bool {
    const TOLERANCE: f64 = 1e-9;

    let ab = b - a;
    let ap = p - a;
    if ab.perp_dot(ap).abs() > TOLERANCE * ab.length() {
        return false;
    }

    let t = ap.dot(ab);
    t >= 0.0 && t <= ab.length_squared()
}
