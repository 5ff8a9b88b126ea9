// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 affine transform.
//!
//! Covers what propagation needs (identity, composition, point mapping) plus a
//! projection onto the XY plane for bounding-volume holders that track a 2-D
//! footprint with [`kurbo`].

use core::ops::Mul;

use kurbo::Affine;

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix. Composition follows the
/// usual convention: `parent * child` maps child-local points into the
/// parent's space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self::from_translation(0.0, 0.0, 0.0);

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::from_cols(
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [x, y, z, 1.0],
        )
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self::from_cols(
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_cols(
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
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

    /// Returns the translation part (the fourth column without `w`).
    #[inline]
    #[must_use]
    pub const fn translation(self) -> [f64; 3] {
        let t = self.cols[3];
        [t[0], t[1], t[2]]
    }

    /// Maps a point through this transform (`w = 1`).
    #[must_use]
    pub fn transform_point(self, p: [f64; 3]) -> [f64; 3] {
        let c = &self.cols;
        let mut out = [0.0; 3];
        for (i, v) in out.iter_mut().enumerate() {
            *v = c[0][i] * p[0] + c[1][i] * p[1] + c[2][i] * p[2] + c[3][i];
        }
        out
    }

    /// Projects this transform onto the XY plane.
    ///
    /// Drops every Z contribution; useful for 2-D footprints of 3-D content.
    #[must_use]
    pub fn to_affine_xy(self) -> Affine {
        let c = &self.cols;
        Affine::new([c[0][0], c[0][1], c[1][0], c[1][1], c[3][0], c[3][1]])
    }

    /// Is every element of this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Returns `true` if every element differs from `other` by at most `eps`.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, eps: f64) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
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
        for (j, col) in out.iter_mut().enumerate() {
            for (i, v) in col.iter_mut().enumerate() {
                *v = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
        assert_eq!(Transform3d::IDENTITY.col(0), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(Transform3d::IDENTITY.col(3), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn translations_compose_additively() {
        let a = Transform3d::from_translation(1.0, 0.0, 0.0);
        let b = Transform3d::from_translation(0.0, 1.0, 0.0);
        assert_eq!((a * b).translation(), [1.0, 1.0, 0.0]);
        assert_eq!(Transform3d::IDENTITY * a, a);
    }

    #[test]
    fn parent_applies_after_child() {
        let parent = Transform3d::from_translation(3.0, 4.0, 0.0);
        let child = Transform3d::from_scale(2.0, 2.0, 2.0);
        let world = parent * child;
        assert_eq!(world.transform_point([1.0, 1.0, 1.0]), [5.0, 6.0, 2.0]);
    }

    #[test]
    fn rotation_maps_x_to_y() {
        let r = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2);
        let p = r.transform_point([1.0, 0.0, 0.0]);
        assert!(p[0].abs() < 1e-9, "x should vanish, got {p:?}");
        assert!((p[1] - 1.0).abs() < 1e-9, "y should be 1, got {p:?}");
    }

    #[test]
    fn xy_projection_maps_rects() {
        let t = Transform3d::from_translation(10.0, 5.0, 99.0) * Transform3d::from_scale(2.0, 3.0, 1.0);
        let r = t.to_affine_xy().transform_rect_bbox(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(r, Rect::new(10.0, 5.0, 12.0, 8.0));
    }

    #[test]
    fn non_finite_detected() {
        let mut t = Transform3d::IDENTITY;
        assert!(t.is_finite());
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
    }

    #[test]
    fn approximate_equality() {
        let a = Transform3d::from_translation(1.0, 2.0, 3.0);
        let mut b = a;
        b.cols[3][0] += 1e-12;
        assert!(a.abs_diff_eq(&b, 1e-9));
        assert!(!a.abs_diff_eq(&Transform3d::IDENTITY, 1e-9));
    }
}
