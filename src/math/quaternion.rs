use super::{Matrix4, Vector3};

/// A rotation quaternion `(x, y, z, w)` with the vector part first.
///
/// Quaternions built with [`from_axis_angle`](Self::from_axis_angle) are unit
/// length, and the rest of the API assumes it: [`inverse`](Self::inverse) is the
/// conjugate, not a general inverse.
///
/// # Rotation direction
///
/// [`rotate_vector`](Self::rotate_vector) evaluates `q⁻¹ · v · q`, which turns
/// `v` by `-angle` about the axis. [`to_matrix4`](Self::to_matrix4) builds the
/// conventional matrix for `q · v · q⁻¹`, which turns by `+angle`. Both are
/// relied on by the render loop; pick the one whose direction you need.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Builds `(sin(angle/2)·axis, cos(angle/2))`.
    ///
    /// `axis` is normalized first. A zero axis is a precondition violation and
    /// produces NaN components.
    pub fn from_axis_angle(axis: impl Into<Vector3>, angle: f32) -> Self {
        let axis = Vector3::normalized(axis.into());
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Replaces `self` with the axis-angle rotation and returns it for chaining.
    pub fn rotate(&mut self, axis: impl Into<Vector3>, angle: f32) -> &mut Self {
        *self = Self::from_axis_angle(axis, angle);
        self
    }

    /// Negates the vector part.
    pub fn inverse(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Hamilton product `self * rhs`.
    pub fn multiply(&self, rhs: &Self) -> Self {
        let (a, b) = (self, rhs);
        Self::new(
            a.x * b.w + a.w * b.x + a.y * b.z - a.z * b.y,
            a.y * b.w + a.w * b.y + a.z * b.x - a.x * b.z,
            a.z * b.w + a.w * b.z + a.x * b.y - a.y * b.x,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }

    /// Returns the vector part of `q⁻¹ · (v, 0) · q`.
    pub fn rotate_vector(&self, v: impl Into<Vector3>) -> Vector3 {
        let v = v.into();
        let pure = Self::new(v.x, v.y, v.z, 0.0);
        let r = self.inverse().multiply(&pure).multiply(self);
        Vector3::new(r.x, r.y, r.z)
    }

    /// Converts to a rotation matrix in column-vector convention.
    ///
    /// No transpose is applied here; matrices are transposed once, when they are
    /// uploaded (see [`Matrix4::to_gpu_array`]).
    #[rustfmt::skip]
    pub fn to_matrix4(&self) -> Matrix4 {
        let Self { x, y, z, w } = *self;
        let (x2, y2, z2) = (x * 2.0, y * 2.0, z * 2.0);
        let (xx, xy, xz) = (x * x2, x * y2, x * z2);
        let (yy, yz, zz) = (y * y2, y * z2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);

        Matrix4::from_rows([
            [1.0 - (yy + zz),         xy - wz,         xz + wy, 0.0],
            [        xy + wz, 1.0 - (xx + zz),         yz - wx, 0.0],
            [        xz - wy,         yz + wx, 1.0 - (xx + yy), 0.0],
            [            0.0,             0.0,             0.0, 1.0],
        ])
    }
}

impl From<Quaternion> for glam::Quat {
    fn from(q: Quaternion) -> Self {
        glam::Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}
