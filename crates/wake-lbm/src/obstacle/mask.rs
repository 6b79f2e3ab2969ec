use glam::DVec2;
use ndarray::Array2;

use crate::error::{check_extent, LbmError, Result};

use super::{polygon::Polygon, Obstacle};

/// Solid cells of the lattice, indexed `(y, x)`.
///
/// Built once before the simulation starts and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleMask {
    cells: Array2<bool>,
    /// Solid cell coordinates in row-major order.
    solid: Vec<(usize, usize)>,
}

impl ObstacleMask {
    /// Rasterises the polygon `vertices`, rotated by `rotation` radians about the vertex average,
    /// onto a `width × height` grid.
    pub fn build(width: usize, height: usize, vertices: &[DVec2], rotation: f64) -> Result<Self> {
        let polygon = Polygon::new(vertices.to_vec())?.rotated(rotation);
        Self::from_obstacle(width, height, &polygon)
    }

    /// Like [`build`](Self::build), but rotates about `center`.
    pub fn build_about(
        width: usize,
        height: usize,
        vertices: &[DVec2],
        center: DVec2,
        rotation: f64,
    ) -> Result<Self> {
        let polygon = Polygon::with_center(vertices.to_vec(), center)?.rotated(rotation);
        Self::from_obstacle(width, height, &polygon)
    }

    /// Marks every cell whose integer coordinate `(x, y)` lies inside `obstacle`.
    pub fn from_obstacle<O: Obstacle + ?Sized>(width: usize, height: usize, obstacle: &O) -> Result<Self> {
        let (width, height) = check_extent(width, height)?;
        let cells = Array2::from_shape_fn((height, width), |(y, x)| {
            obstacle.contains(DVec2::new(x as f64, y as f64))
        });

        Ok(Self::from_cells_unchecked(cells))
    }

    /// A mask without any solid cells.
    pub fn empty(width: usize, height: usize) -> Result<Self> {
        let (width, height) = check_extent(width, height)?;
        Ok(Self::from_cells_unchecked(Array2::from_elem((height, width), false)))
    }

    pub fn from_cells(cells: Array2<bool>) -> Result<Self> {
        let (height, width) = cells.dim();
        check_extent(width, height)?;

        Ok(Self::from_cells_unchecked(cells))
    }

    fn from_cells_unchecked(cells: Array2<bool>) -> Self {
        let solid = cells
            .indexed_iter()
            .filter_map(|(idx, &s)| s.then_some(idx))
            .collect();

        Self { cells, solid }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    #[inline]
    pub fn is_solid(&self, y: usize, x: usize) -> bool {
        self.cells[(y, x)]
    }

    #[inline]
    pub fn cells(&self) -> &Array2<bool> {
        &self.cells
    }

    /// The solid cells as `(y, x)` pairs, in row-major order.
    #[inline]
    pub fn solid_cells(&self) -> &[(usize, usize)] {
        &self.solid
    }

    #[inline]
    pub fn solid_count(&self) -> usize {
        self.solid.len()
    }

    /// Checks that `width × height` matches this mask.
    pub fn check_extent(&self, width: usize, height: usize) -> Result<()> {
        if self.width() != width || self.height() != height {
            return Err(LbmError::parameter(
                "mask",
                format!(
                    "mask is {}×{} but the field is {width}×{height}",
                    self.width(),
                    self.height(),
                ),
            ));
        }

        Ok(())
    }

    /// Number of 4-connected solid regions. Does not wrap around the domain edges.
    pub fn regions(&self) -> usize {
        self.count_regions(true)
    }

    /// Number of 4-connected fluid regions. Does not wrap around the domain edges, so a fluid
    /// cell enclosed by the obstacle adds a region.
    pub fn fluid_regions(&self) -> usize {
        self.count_regions(false)
    }

    fn count_regions(&self, solid: bool) -> usize {
        let (height, width) = self.cells.dim();
        let mut seen = Array2::from_elem((height, width), false);
        let mut stack = Vec::new();
        let mut regions = 0;

        for (start, &cell) in self.cells.indexed_iter() {
            if cell != solid || seen[start] {
                continue;
            }

            regions += 1;
            seen[start] = true;
            stack.push(start);

            while let Some((y, x)) = stack.pop() {
                let neighbours = [
                    (y.wrapping_sub(1), x),
                    (y + 1, x),
                    (y, x.wrapping_sub(1)),
                    (y, x + 1),
                ];

                for n in neighbours {
                    if n.0 < height && n.1 < width && self.cells[n] == solid && !seen[n] {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        regions
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use crate::obstacle::circle::Circle;

    use super::*;

    #[test]
    fn build_is_deterministic() {
        let vertices = [DVec2::new(10.0, 5.0), DVec2::new(30.0, 12.0), DVec2::new(14.0, 25.0)];

        let a = ObstacleMask::build(40, 30, &vertices, -FRAC_PI_2).unwrap();
        let b = ObstacleMask::build(40, 30, &vertices, -FRAC_PI_2).unwrap();

        assert_eq!(a, b);
        assert!(a.solid_count() > 0);
    }

    #[test]
    fn build_rejects_degenerate_geometry() {
        let line = [DVec2::new(1.0, 1.0), DVec2::new(5.0, 1.0), DVec2::new(9.0, 1.0)];

        assert!(matches!(ObstacleMask::build(10, 10, &line, 0.0), Err(LbmError::InvalidGeometry(_))));
    }

    #[test]
    fn build_about_rotates_about_given_center() {
        let vertices = [DVec2::new(2.0, 2.0), DVec2::new(6.0, 2.0), DVec2::new(2.0, 6.0)];
        let rotation = std::f64::consts::PI;

        let about_corner = ObstacleMask::build_about(10, 10, &vertices, DVec2::new(2.0, 2.0), rotation).unwrap();
        assert!(about_corner.is_solid(1, 1));
        assert!(!about_corner.is_solid(4, 4));
        assert!(about_corner.solid_cells().iter().all(|&(y, x)| y <= 2 && x <= 2));

        let about_average = ObstacleMask::build(10, 10, &vertices, rotation).unwrap();
        assert!(about_average.is_solid(4, 4));
        assert!(!about_average.is_solid(1, 1));
    }

    #[test]
    fn rejects_empty_grid() {
        assert!(matches!(ObstacleMask::empty(0, 10), Err(LbmError::InvalidParameter { name: "width", .. })));
        assert!(matches!(ObstacleMask::empty(10, 0), Err(LbmError::InvalidParameter { name: "height", .. })));
    }

    #[test]
    fn rasterises_circle() {
        let circle = Circle::new(DVec2::new(5.0, 5.0), 1.0).unwrap();
        let mask = ObstacleMask::from_obstacle(10, 8, &circle).unwrap();

        assert_eq!(mask.width(), 10);
        assert_eq!(mask.height(), 8);
        assert_eq!(mask.solid_cells(), &[(4, 5), (5, 4), (5, 5), (5, 6), (6, 5)]);
        assert_eq!(mask.regions(), 1);
    }

    #[test]
    fn counts_separate_regions() {
        let mut cells = Array2::from_elem((5, 5), false);
        cells[(0, 0)] = true;
        cells[(0, 1)] = true;
        cells[(3, 3)] = true;
        cells[(4, 4)] = true;
        let mask = ObstacleMask::from_cells(cells).unwrap();

        assert_eq!(mask.regions(), 3);
        assert_eq!(mask.fluid_regions(), 1);
    }

    #[test]
    fn enclosed_fluid_is_a_separate_region() {
        let mut cells = Array2::from_elem((5, 5), false);
        for y in 1..=3 {
            for x in 1..=3 {
                cells[(y, x)] = true;
            }
        }
        cells[(2, 2)] = false;
        let mask = ObstacleMask::from_cells(cells).unwrap();

        assert_eq!(mask.regions(), 1);
        assert_eq!(mask.fluid_regions(), 2);
    }
}
