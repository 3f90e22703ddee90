use std::ops::{Add, Mul, Neg, Sub};

/// A three-component vector of `f32`.
///
/// `Vector3` is a plain `Copy` value: the associated functions (`sub`, `cross`,
/// `normalized`, ...) return new vectors, while the `&mut self` methods
/// (`scale`, `subtract`, `multiply`, `normalize`) mutate in place and return
/// `&mut Self` for chaining.
///
/// # Zero-length vectors
///
/// [`normalize`](Self::normalize) and [`normalized`](Self::normalized) divide by
/// the vector length without a guard. Normalizing a zero vector is undefined
/// input and yields NaN components.
///
/// # Example
///
/// ```
/// use ripple::Vector3;
///
/// let mut v = Vector3::new(3.0, 0.0, 4.0);
/// v.normalize();
/// assert_eq!(v, Vector3::new(0.6, 0.0, 0.8));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns `a - b`.
    pub fn sub(a: Self, b: Self) -> Self {
        Self::new(a.x - b.x, a.y - b.y, a.z - b.z)
    }

    /// Returns `a / |a|`. See the type docs for zero-length input.
    pub fn normalized(a: Self) -> Self {
        let len = a.length();
        Self::new(a.x / len, a.y / len, a.z / len)
    }

    /// Right-handed cross product `a × b`.
    pub fn cross(a: Self, b: Self) -> Self {
        Self::new(
            a.y * b.z - a.z * b.y,
            a.z * b.x - a.x * b.z,
            a.x * b.y - a.y * b.x,
        )
    }

    pub fn dot(a: Self, b: Self) -> f32 {
        a.x * b.x + a.y * b.y + a.z * b.z
    }

    pub fn length(&self) -> f32 {
        self.x.hypot(self.y).hypot(self.z)
    }

    /// Multiplies every component by `s`.
    pub fn scale(&mut self, s: f32) -> &mut Self {
        self.x *= s;
        self.y *= s;
        self.z *= s;
        self
    }

    /// Subtracts `v` component-wise.
    pub fn subtract(&mut self, v: Self) -> &mut Self {
        *self = Self::sub(*self, v);
        self
    }

    /// Component-wise (Hadamard) product with `v`.
    pub fn multiply(&mut self, v: Self) -> &mut Self {
        self.x *= v.x;
        self.y *= v.y;
        self.z *= v.z;
        self
    }

    /// Normalizes in place. See the type docs for zero-length input.
    pub fn normalize(&mut self) -> &mut Self {
        *self = Self::normalized(*self);
        self
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Vector3> for [f32; 3] {
    fn from(v: Vector3) -> Self {
        v.to_array()
    }
}

impl From<glam::Vec3> for Vector3 {
    fn from(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for glam::Vec3 {
    fn from(v: Vector3) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Vector3::sub(self, rhs)
    }
}

impl Mul<f32> for Vector3 {
    type Output = Self;

    fn mul(mut self, rhs: f32) -> Self {
        self.scale(rhs);
        self
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cross_of_basis_axes_is_right_handed() {
        assert_eq!(Vector3::cross(Vector3::X, Vector3::Y), Vector3::Z);
        assert_eq!(Vector3::cross(Vector3::Y, Vector3::Z), Vector3::X);
        assert_eq!(Vector3::cross(Vector3::Z, Vector3::X), Vector3::Y);
    }

    #[test]
    fn in_place_ops_chain() {
        let mut v = Vector3::new(1.0, 2.0, 3.0);
        v.subtract(Vector3::new(1.0, 1.0, 1.0))
            .scale(2.0)
            .multiply(Vector3::new(1.0, 0.5, -1.0));
        assert_eq!(v, Vector3::new(0.0, 1.0, -4.0));
    }

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = Vector3::new(-2.0, 7.0, 0.5);
        v.normalize();
        assert_abs_diff_eq!(v.length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn normalizing_zero_is_nan() {
        let v = Vector3::normalized(Vector3::ZERO);
        assert!(v.x.is_nan() && v.y.is_nan() && v.z.is_nan());
    }

    #[test]
    fn dot_and_operators() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, -5.0, 6.0);
        assert_eq!(Vector3::dot(a, b), 12.0);
        assert_eq!(a + b - b, a);
        assert_eq!(-a * 2.0, Vector3::new(-2.0, -4.0, -6.0));
    }
}
