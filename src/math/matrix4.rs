use std::ops::Mul;

use super::{Quaternion, Vector3};

/// A 4x4 `f32` matrix stored as an array of rows.
///
/// `Matrix4` uses the column-vector convention: a point is transformed as
/// `M · v`, and translation lives in the last column. WGSL wants column-major
/// data, so the transpose happens exactly once, in [`to_gpu_array`](Self::to_gpu_array).
/// Nothing else in the crate transposes for the GPU.
///
/// The affine builders ([`translate`](Self::translate), [`scale`](Self::scale),
/// [`rotate`](Self::rotate)) compose in world space: each one pre-multiplies,
/// so the newest operation is applied last.
///
/// # Example
///
/// ```
/// use ripple::{Matrix4, Vector3};
///
/// let mut m = Matrix4::identity();
/// m.translate([1.0, 2.0, 3.0]);
/// assert_eq!(m.transform_point(Vector3::ZERO), Vector3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4 {
    rows: [[f32; 4]; 4],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    pub const ZERO: Self = Self::from_rows([[0.0; 4]; 4]);

    #[rustfmt::skip]
    pub const IDENTITY: Self = Self::from_rows([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub const fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self { rows }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn rows(&self) -> &[[f32; 4]; 4] {
        &self.rows
    }

    pub fn set_rows(&mut self, rows: [[f32; 4]; 4]) {
        self.rows = rows;
    }

    /// Element at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.rows[row][col]
    }

    /// Returns `a · b`.
    pub fn product(a: &Self, b: &Self) -> Self {
        let mut out = Self::ZERO;
        for row in 0..4 {
            for col in 0..4 {
                out.rows[row][col] = a.rows[row][0] * b.rows[0][col]
                    + a.rows[row][1] * b.rows[1][col]
                    + a.rows[row][2] * b.rows[2][col]
                    + a.rows[row][3] * b.rows[3][col];
            }
        }
        out
    }

    /// Returns every element multiplied by `s`.
    pub fn scaled(a: &Self, s: f32) -> Self {
        Self::from_rows(a.rows.map(|row| row.map(|v| v * s)))
    }

    /// Returns the transpose of `a`.
    pub fn transposed(a: &Self) -> Self {
        let r = &a.rows;
        Self::from_rows(std::array::from_fn(|i| std::array::from_fn(|j| r[j][i])))
    }

    /// Determinant by full 24-term expansion.
    #[rustfmt::skip]
    pub fn determinant(&self) -> f32 {
        let [[a11, a12, a13, a14],
             [a21, a22, a23, a24],
             [a31, a32, a33, a34],
             [a41, a42, a43, a44]] = self.rows;

          a11 * a22 * a33 * a44 + a11 * a23 * a34 * a42 + a11 * a24 * a32 * a43
        + a12 * a21 * a34 * a43 + a12 * a23 * a31 * a44 + a12 * a24 * a33 * a41
        + a13 * a21 * a32 * a44 + a13 * a22 * a34 * a41 + a13 * a24 * a31 * a42
        + a14 * a21 * a33 * a42 + a14 * a22 * a31 * a43 + a14 * a23 * a32 * a41
        - a11 * a22 * a34 * a43 - a11 * a23 * a32 * a44 - a11 * a24 * a33 * a42
        - a12 * a21 * a33 * a44 - a12 * a23 * a34 * a41 - a12 * a24 * a31 * a43
        - a13 * a21 * a34 * a42 - a13 * a22 * a31 * a44 - a13 * a24 * a32 * a41
        - a14 * a21 * a32 * a43 - a14 * a22 * a33 * a41 - a14 * a23 * a31 * a42
    }

    /// Inverse via the adjugate divided by the determinant.
    ///
    /// A singular matrix (determinant exactly `0.0`) yields [`Matrix4::ZERO`]
    /// rather than an error, so a degenerate transform only blanks what it
    /// touches.
    #[rustfmt::skip]
    pub fn inverted(a: &Self) -> Self {
        let det = a.determinant();
        if det == 0.0 {
            return Self::ZERO;
        }

        let [[a11, a12, a13, a14],
             [a21, a22, a23, a24],
             [a31, a32, a33, a34],
             [a41, a42, a43, a44]] = a.rows;

        let b11 = a22 * a33 * a44 + a23 * a34 * a42 + a24 * a32 * a43 - a22 * a34 * a43 - a23 * a32 * a44 - a24 * a33 * a42;
        let b12 = a12 * a34 * a43 + a13 * a32 * a44 + a14 * a33 * a42 - a12 * a33 * a44 - a13 * a34 * a42 - a14 * a32 * a43;
        let b13 = a12 * a23 * a44 + a13 * a24 * a42 + a14 * a22 * a43 - a12 * a24 * a43 - a13 * a22 * a44 - a14 * a23 * a42;
        let b14 = a12 * a24 * a33 + a13 * a22 * a34 + a14 * a23 * a32 - a12 * a23 * a34 - a13 * a24 * a32 - a14 * a22 * a33;

        let b21 = a21 * a34 * a43 + a23 * a31 * a44 + a24 * a33 * a41 - a21 * a33 * a44 - a23 * a34 * a41 - a24 * a31 * a43;
        let b22 = a11 * a33 * a44 + a13 * a34 * a41 + a14 * a31 * a43 - a11 * a34 * a43 - a13 * a31 * a44 - a14 * a33 * a41;
        let b23 = a11 * a24 * a43 + a13 * a21 * a44 + a14 * a23 * a41 - a11 * a23 * a44 - a13 * a24 * a41 - a14 * a21 * a43;
        let b24 = a11 * a23 * a34 + a13 * a24 * a31 + a14 * a21 * a33 - a11 * a24 * a33 - a13 * a21 * a34 - a14 * a23 * a31;

        let b31 = a21 * a32 * a44 + a22 * a34 * a41 + a24 * a31 * a42 - a21 * a34 * a42 - a22 * a31 * a44 - a24 * a32 * a41;
        let b32 = a11 * a34 * a42 + a12 * a31 * a44 + a14 * a32 * a41 - a11 * a32 * a44 - a12 * a34 * a41 - a14 * a31 * a42;
        let b33 = a11 * a22 * a44 + a12 * a24 * a41 + a14 * a21 * a42 - a11 * a24 * a42 - a12 * a21 * a44 - a14 * a22 * a41;
        let b34 = a11 * a24 * a32 + a12 * a21 * a34 + a14 * a22 * a31 - a11 * a22 * a34 - a12 * a24 * a31 - a14 * a21 * a32;

        let b41 = a21 * a33 * a42 + a22 * a31 * a43 + a23 * a32 * a41 - a21 * a32 * a43 - a22 * a33 * a41 - a23 * a31 * a42;
        let b42 = a11 * a32 * a43 + a12 * a33 * a41 + a13 * a31 * a42 - a11 * a33 * a42 - a12 * a31 * a43 - a13 * a32 * a41;
        let b43 = a11 * a23 * a42 + a12 * a21 * a43 + a13 * a22 * a41 - a11 * a22 * a43 - a12 * a23 * a41 - a13 * a21 * a42;
        let b44 = a11 * a22 * a33 + a12 * a23 * a31 + a13 * a21 * a32 - a11 * a23 * a32 - a12 * a21 * a33 - a13 * a22 * a31;

        Self::scaled(
            &Self::from_rows([
                [b11, b12, b13, b14],
                [b21, b22, b23, b24],
                [b31, b32, b33, b34],
                [b41, b42, b43, b44],
            ]),
            1.0 / det,
        )
    }

    /// `self = self · rhs`
    pub fn multiply(&mut self, rhs: &Self) -> &mut Self {
        *self = Self::product(self, rhs);
        self
    }

    /// `self = lhs · self`
    pub fn premultiply(&mut self, lhs: &Self) -> &mut Self {
        *self = Self::product(lhs, self);
        self
    }

    pub fn multiply_scalar(&mut self, s: f32) -> &mut Self {
        *self = Self::scaled(self, s);
        self
    }

    pub fn transpose(&mut self) -> &mut Self {
        *self = Self::transposed(self);
        self
    }

    /// Inverts in place; see [`inverted`](Self::inverted) for singular input.
    pub fn invert(&mut self) -> &mut Self {
        *self = Self::inverted(self);
        self
    }

    /// Appends a world-space translation.
    #[rustfmt::skip]
    pub fn translate(&mut self, v: impl Into<Vector3>) -> &mut Self {
        let v = v.into();
        self.premultiply(&Self::from_rows([
            [1.0, 0.0, 0.0, v.x],
            [0.0, 1.0, 0.0, v.y],
            [0.0, 0.0, 1.0, v.z],
            [0.0, 0.0, 0.0, 1.0],
        ]))
    }

    /// Appends a scale along the world axes.
    #[rustfmt::skip]
    pub fn scale(&mut self, v: impl Into<Vector3>) -> &mut Self {
        let v = v.into();
        self.premultiply(&Self::from_rows([
            [v.x, 0.0, 0.0, 0.0],
            [0.0, v.y, 0.0, 0.0],
            [0.0, 0.0, v.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]))
    }

    /// Appends a rotation of `angle` radians about `axis`, built through a quaternion.
    pub fn rotate(&mut self, axis: impl Into<Vector3>, angle: f32) -> &mut Self {
        let rotation = Quaternion::from_axis_angle(axis, angle).to_matrix4();
        self.premultiply(&rotation)
    }

    /// Transforms a point (`w = 1`), ignoring the projective row.
    pub fn transform_point(&self, p: impl Into<Vector3>) -> Vector3 {
        let p = p.into();
        let r = &self.rows;
        Vector3::new(
            r[0][0] * p.x + r[0][1] * p.y + r[0][2] * p.z + r[0][3],
            r[1][0] * p.x + r[1][1] * p.y + r[1][2] * p.z + r[1][3],
            r[2][0] * p.x + r[2][1] * p.y + r[2][2] * p.z + r[2][3],
        )
    }

    /// Transforms a direction (`w = 0`).
    pub fn transform_vector(&self, v: impl Into<Vector3>) -> Vector3 {
        let v = v.into();
        let r = &self.rows;
        Vector3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    /// Rows concatenated, in storage order.
    pub fn to_rows_array(&self) -> [f32; 16] {
        std::array::from_fn(|i| self.rows[i / 4][i % 4])
    }

    /// Column-major data for upload to a WGSL `mat4x4<f32>`.
    ///
    /// This is the only place the row/column convention is crossed.
    pub fn to_gpu_array(&self) -> [f32; 16] {
        Self::transposed(self).to_rows_array()
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::product(&self, &rhs)
    }
}

impl From<Matrix4> for glam::Mat4 {
    fn from(m: Matrix4) -> Self {
        glam::Mat4::from_cols_array(&m.to_gpu_array())
    }
}

impl From<glam::Mat4> for Matrix4 {
    fn from(m: glam::Mat4) -> Self {
        Matrix4::transposed(&Matrix4::from_rows(m.to_cols_array_2d()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    fn assert_matrix_near(a: &Matrix4, b: &Matrix4, epsilon: f32) {
        for row in 0..4 {
            for col in 0..4 {
                assert_abs_diff_eq!(a.get(row, col), b.get(row, col), epsilon = epsilon);
            }
        }
    }

    /// Deterministic pseudo-random matrices (xorshift) so failures reproduce.
    fn sample_matrices(count: usize) -> Vec<Matrix4> {
        let mut state: u32 = 0x9E37_79B9;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as f32 / u32::MAX as f32) * 4.0 - 2.0
        };
        (0..count)
            .map(|_| Matrix4::from_rows(std::array::from_fn(|_| std::array::from_fn(|_| next()))))
            .collect()
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let mut checked = 0;
        for m in sample_matrices(64) {
            // Skip nearly singular samples; f32 precision breaks down there.
            if m.determinant().abs() < 0.5 {
                continue;
            }
            let product = Matrix4::inverted(&m) * m;
            assert_matrix_near(&product, &Matrix4::IDENTITY, 1e-3);
            checked += 1;
        }
        assert!(checked > 10);
    }

    #[test]
    fn inverse_matches_glam() {
        let mut m = Matrix4::identity();
        m.rotate([1.0, 2.0, 0.5], 0.8)
            .scale([2.0, 0.5, 3.0])
            .translate([4.0, -1.0, 2.0]);
        let ours = Matrix4::inverted(&m);
        let reference = Matrix4::from(glam::Mat4::from(m).inverse());
        assert_matrix_near(&ours, &reference, 1e-4);
    }

    #[test]
    fn determinant_matches_glam() {
        for m in sample_matrices(8) {
            assert_abs_diff_eq!(
                m.determinant(),
                glam::Mat4::from(m).determinant(),
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn singular_matrix_inverts_to_zero() {
        let mut m = Matrix4::identity();
        m.scale([1.0, 0.0, 1.0]);
        assert_eq!(Matrix4::inverted(&m), Matrix4::ZERO);
    }

    #[test]
    fn transpose_is_an_involution() {
        for m in sample_matrices(16) {
            assert_eq!(Matrix4::transposed(&Matrix4::transposed(&m)), m);
        }
    }

    #[test]
    fn translate_moves_origin() {
        let mut m = Matrix4::identity();
        m.translate([1.0, 2.0, 3.0]);
        assert_eq!(m.transform_point(Vector3::ZERO), Vector3::new(1.0, 2.0, 3.0));
        // Directions ignore translation.
        assert_eq!(m.transform_vector(Vector3::X), Vector3::X);
    }

    #[test]
    fn builders_compose_in_world_space() {
        // Translate first, then rotate: the translation itself is rotated.
        let mut m = Matrix4::identity();
        m.translate([1.0, 0.0, 0.0]).rotate(Vector3::Y, FRAC_PI_2);
        let p = m.transform_point(Vector3::ZERO);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn rotate_and_rotate_vector_turn_opposite_ways() {
        let angle = 0.37;
        let mut m = Matrix4::identity();
        m.rotate(Vector3::Y, angle);
        let by_matrix = m.transform_vector(Vector3::new(0.15, 0.0, 0.0));
        let by_quat = Quaternion::from_axis_angle(Vector3::Y, -angle)
            .rotate_vector(Vector3::new(0.15, 0.0, 0.0));
        assert_abs_diff_eq!(by_matrix.x, by_quat.x, epsilon = 1e-6);
        assert_abs_diff_eq!(by_matrix.z, by_quat.z, epsilon = 1e-6);
    }

    #[test]
    fn gpu_array_is_column_major() {
        let mut m = Matrix4::identity();
        m.translate([1.0, 2.0, 3.0]);
        let gpu = m.to_gpu_array();
        assert_eq!(&gpu[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(glam::Mat4::from(m), glam::Mat4::from_translation(glam::vec3(1.0, 2.0, 3.0)));
    }

    #[test]
    fn scalar_multiply_and_operator() {
        let mut m = Matrix4::identity();
        m.multiply_scalar(2.0);
        assert_eq!(m.get(3, 3), 2.0);
        assert_eq!(Matrix4::IDENTITY * m, m);

        let mut a = Matrix4::identity();
        a.translate([1.0, 0.0, 0.0]);
        let mut b = Matrix4::identity();
        b.scale([2.0, 2.0, 2.0]);
        let mut post = a;
        post.multiply(&b);
        let mut pre = a;
        pre.premultiply(&b);
        assert_eq!(post, a * b);
        assert_eq!(pre, b * a);
    }
}
