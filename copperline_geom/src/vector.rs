// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D integer vectors in board units (nanometres).

use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A 2D vector (or point) with `i32` nanometre components.
///
/// Products widen to `i128`; a board is tiny compared to either range, so
/// intermediate arithmetic never overflows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VecI {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component.
    pub y: i32,
}

impl VecI {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a vector from components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Dot product, widened.
    pub fn dot(self, other: Self) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }

    /// Cross product (z component), widened.
    pub fn cross(self, other: Self) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }

    /// Squared Euclidean length.
    pub fn length_sq(self) -> i128 {
        self.dot(self)
    }

    /// Euclidean length, rounded down.
    pub fn length(self) -> i64 {
        isqrt_i128(self.length_sq())
    }

    /// Squared distance to `other`.
    pub fn dist_sq(self, other: Self) -> i128 {
        (self - other).length_sq()
    }

    /// Distance to `other`, rounded down.
    pub fn dist(self, other: Self) -> i64 {
        isqrt_i128(self.dist_sq(other))
    }

    /// The vector rotated 90 degrees counter-clockwise.
    pub const fn perpendicular(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    /// The vector scaled to length `len`, rounded to the nearest lattice
    /// point. The zero vector resizes to itself.
    pub fn resized(self, len: i64) -> Self {
        let cur = self.length();
        if cur == 0 {
            return Self::ZERO;
        }
        Self {
            x: div_round(self.x as i128 * len as i128, cur as i128) as i32,
            y: div_round(self.y as i128 * len as i128, cur as i128) as i32,
        }
    }
}

impl Add for VecI {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for VecI {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for VecI {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for VecI {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for VecI {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<i32> for VecI {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Signed division rounded to the nearest integer (ties away from zero).
pub(crate) fn div_round(num: i128, den: i128) -> i128 {
    debug_assert!(den != 0);
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    if num >= 0 {
        (num + den / 2) / den
    } else {
        (num - den / 2) / den
    }
}

pub(crate) fn isqrt_i128(v: i128) -> i64 {
    debug_assert!(v >= 0);
    (v as u128).isqrt() as i64
}
