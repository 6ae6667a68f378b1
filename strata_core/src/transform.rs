// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transform.
//!
//! Covers what layer geometry and 3D ordering need: composition, inversion,
//! point mapping and projection of screen points back onto a layer plane.

use core::ops::Mul;

use kurbo::{Point, Rect};

use crate::geometry::Point3;

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, matching the memory layout
/// used by GPU APIs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from a column-major 2-D array.
    #[inline]
    #[must_use]
    pub const fn from_cols_array_2d(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Y axis (radians).
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Returns `self * Translate(x, y, z)`.
    #[inline]
    #[must_use]
    pub fn translate3d(self, x: f64, y: f64, z: f64) -> Self {
        self * Self::from_translation(x, y, z)
    }

    /// Returns `true` for the identity matrix.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Returns the determinant.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let m = self.to_row_major();
        let mut det = 0.0;
        for c in 0..4 {
            let sign = if c % 2 == 0 { 1.0 } else { -1.0 };
            det += sign * m[0][c] * minor3(&m, 0, c);
        }
        det
    }

    /// Returns `true` if the transform has an inverse.
    #[inline]
    #[must_use]
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > f64::EPSILON
    }

    /// Returns the inverse transform, or `None` if the matrix is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() <= f64::EPSILON {
            return None;
        }
        let m = self.to_row_major();
        let mut inv_rows = [[0.0_f64; 4]; 4];
        for (r, row) in inv_rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                // Adjugate is the transposed cofactor matrix.
                let sign = if (r + c) % 2 == 0 { 1.0 } else { -1.0 };
                *value = sign * minor3(&m, c, r) / det;
            }
        }
        Some(Self::from_row_major(inv_rows))
    }

    /// Maps a 3D point, performing the perspective divide.
    #[must_use]
    pub fn map_point3(&self, p: Point3) -> Point3 {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[2][0] * p.z + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[2][1] * p.z + c[3][1];
        let z = c[0][2] * p.x + c[1][2] * p.y + c[2][2] * p.z + c[3][2];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[2][3] * p.z + c[3][3];
        if w == 1.0 || w == 0.0 {
            Point3::new(x, y, z)
        } else {
            Point3::new(x / w, y / w, z / w)
        }
    }

    /// Maps a 2D point lying on the z = 0 plane.
    #[must_use]
    pub fn map_point(&self, p: Point) -> Point {
        self.map_point3(Point3::from_point(p)).to_point()
    }

    /// Projects a 2D point through this transform onto the z = 0 plane of the
    /// destination space.
    ///
    /// The point is treated as a ray parallel to the z axis; the ray is
    /// intersected with the plane that this transform maps z = 0 onto. Used to
    /// map screen points into the local space of a transformed layer (with
    /// `self` being the inverse of the layer's transform).
    #[must_use]
    pub fn project_point(&self, p: Point) -> Point {
        let c = &self.cols;
        // The z coordinate that lands on z = 0 after mapping.
        let z = if c[2][2] == 0.0 {
            0.0
        } else {
            -(c[0][2] * p.x + c[1][2] * p.y + c[3][2]) / c[2][2]
        };
        self.map_point3(Point3::new(p.x, p.y, z)).to_point()
    }

    /// Maps the four corners of `rect` (on z = 0).
    #[must_use]
    pub fn map_rect_to_quad(&self, rect: Rect) -> [Point3; 4] {
        [
            self.map_point3(Point3::new(rect.x0, rect.y0, 0.0)),
            self.map_point3(Point3::new(rect.x1, rect.y0, 0.0)),
            self.map_point3(Point3::new(rect.x1, rect.y1, 0.0)),
            self.map_point3(Point3::new(rect.x0, rect.y1, 0.0)),
        ]
    }

    fn to_row_major(self) -> [[f64; 4]; 4] {
        let mut m = [[0.0; 4]; 4];
        for (c, col) in self.cols.iter().enumerate() {
            for (r, v) in col.iter().enumerate() {
                m[r][c] = *v;
            }
        }
        m
    }

    fn from_row_major(m: [[f64; 4]; 4]) -> Self {
        let mut cols = [[0.0; 4]; 4];
        for (r, row) in m.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                cols[c][r] = *v;
            }
        }
        Self { cols }
    }
}

/// Determinant of the 3×3 minor of `m` with row `skip_r` and column `skip_c`
/// removed.
fn minor3(m: &[[f64; 4]; 4], skip_r: usize, skip_c: usize) -> f64 {
    let mut sub = [[0.0_f64; 3]; 3];
    let mut sr = 0;
    for (r, row) in m.iter().enumerate() {
        if r == skip_r {
            continue;
        }
        let mut sc = 0;
        for (c, v) in row.iter().enumerate() {
            if c == skip_c {
                continue;
            }
            sub[sr][sc] = *v;
            sc += 1;
        }
        sr += 1;
    }
    sub[0][0] * (sub[1][1] * sub[2][2] - sub[1][2] * sub[2][1])
        - sub[0][1] * (sub[1][0] * sub[2][2] - sub[1][2] * sub[2][0])
        + sub[0][2] * (sub[1][0] * sub[2][1] - sub[1][1] * sub[2][0])
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        for (j, out_col) in out.iter_mut().enumerate() {
            for (i, value) in out_col.iter_mut().enumerate() {
                *value =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}
