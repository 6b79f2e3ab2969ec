//! The D2Q9 velocity set.

use glam::IVec2;

/// Number of discrete velocities in the lattice.
pub const Q: usize = 9;

/// Two dimensional, nine velocity lattice.
///
/// Directions are ordered starting at rest and then clockwise from north:
///
/// ```text
///  8  1  2
///  7  0  3
///  6  5  4
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct D2Q9;

impl D2Q9 {
    pub const Q: usize = Q;

    /// X component of each discrete velocity.
    pub const CX: [i32; Q] = [0, 0, 1, 1, 1, 0, -1, -1, -1];
    /// Y component of each discrete velocity.
    pub const CY: [i32; Q] = [0, 1, 1, 0, -1, -1, -1, 0, 1];
    /// Quadrature weights. Sum to one.
    pub const WEIGHTS: [f64; Q] = [
        4.0 / 9.0,
        1.0 / 9.0,
        1.0 / 36.0,
        1.0 / 9.0,
        1.0 / 36.0,
        1.0 / 9.0,
        1.0 / 36.0,
        1.0 / 9.0,
        1.0 / 36.0,
    ];
    /// Index of the reversed direction, used for bounce-back.
    pub const OPPOSITE: [usize; Q] = [0, 5, 6, 7, 8, 1, 2, 3, 4];

    /// The eastward (+x) direction.
    pub const EAST: usize = 3;

    #[inline]
    pub fn velocity(d: usize) -> IVec2 {
        IVec2::new(Self::CX[d], Self::CY[d])
    }

    #[inline]
    pub fn weight(d: usize) -> f64 {
        Self::WEIGHTS[d]
    }

    #[inline]
    pub fn opposite(d: usize) -> usize {
        Self::OPPOSITE[d]
    }

    pub fn directions() -> impl Iterator<Item = Direction> {
        (0..Q).map(|index| Direction {
            index,
            velocity: Self::velocity(index),
            weight: Self::weight(index),
            opposite: Self::opposite(index),
        })
    }

    /// Second order equilibrium population for direction `d`.
    #[inline]
    pub fn equilibrium(d: usize, rho: f64, ux: f64, uy: f64) -> f64 {
        let cu = Self::CX[d] as f64 * ux + Self::CY[d] as f64 * uy;
        let u2 = ux * ux + uy * uy;

        rho * Self::WEIGHTS[d] * (1.0 + 3.0 * cu + 4.5 * cu * cu - 1.5 * u2)
    }
}

/// Index `i + offset` wrapped periodically into `0..n`.
#[inline]
pub fn wrap(i: usize, offset: i32, n: usize) -> usize {
    (i as isize + offset as isize).rem_euclid(n as isize) as usize
}

/// A single lattice direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub index: usize,
    pub velocity: IVec2,
    pub weight: f64,
    pub opposite: usize,
}
