//! Core value types: integer grid vectors and 2x2 transforms

use std::fmt;

/// 2D integer vector, used both as a grid position and as a grid extent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }

    pub fn subtract(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }

    pub fn negate(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }

    /// Component-wise floored modulo: the result takes the sign of `other`.
    ///
    /// Wrapping a position onto a grid is `pos.modulo(grid.size())`.
    ///
    /// # Panics
    ///
    /// Panics if either component of `other` is zero.
    pub fn modulo(self, other: Self) -> Self {
        Self {
            x: floored_rem(self.x, other.x),
            y: floored_rem(self.y, other.y),
        }
    }
}

#[inline]
fn floored_rem(a: i32, b: i32) -> i32 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 2x2 integer matrix, data given in row form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matrix {
    pub data: [[i32; 2]; 2],
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new([[1, 0], [0, 1]]);
    /// Rotates a vector counterclockwise by a quarter turn
    pub const ROTATE_CCW: Matrix = Matrix::new([[0, -1], [1, 0]]);
    pub const ROTATE_CW: Matrix = Matrix::new([[0, 1], [-1, 0]]);

    pub const fn new(data: [[i32; 2]; 2]) -> Self {
        Self { data }
    }

    pub fn apply(&self, v: Vector) -> Vector {
        let d = &self.data;
        Vector::new(
            d[0][0] * v.x + d[1][0] * v.y,
            d[0][1] * v.x + d[1][1] * v.y,
        )
    }
}
