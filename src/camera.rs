use crate::math::{Matrix4, Vector3};

/// Clip-space depth convention a projection matrix targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthRange {
    /// OpenGL/WebGL: NDC depth in `[-1, 1]`.
    #[default]
    NegativeOneToOne,
    /// wgpu/Vulkan/Metal/D3D: NDC depth in `[0, 1]`.
    ZeroToOne,
}

/// Parameters for [`PerspectiveCamera::new`].
#[derive(Clone, Copy, Debug)]
pub struct PerspectiveParams {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Width / height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vector3,
    pub target: Vector3,
}

impl Default for PerspectiveParams {
    fn default() -> Self {
        Self {
            fov: 30.0,
            aspect: 1.0,
            near: 0.1,
            far: 10.0,
            position: Vector3::ZERO,
            target: Vector3::ZERO,
        }
    }
}

/// A perspective camera with cached projection and view matrices.
///
/// The projection matrix depends only on fov/aspect/near/far and the view matrix
/// only on position/target/up. Each is rebuilt by its own setters and never
/// per frame, so reading [`projection_matrix`](Self::projection_matrix) and
/// [`view_matrix`](Self::view_matrix) every frame is free.
///
/// `up` is fixed at world up `(0, 1, 0)`.
///
/// # Example
///
/// ```
/// use ripple::{PerspectiveCamera, PerspectiveParams, Vector3};
///
/// let mut camera = PerspectiveCamera::new(PerspectiveParams {
///     aspect: 16.0 / 9.0,
///     ..Default::default()
/// });
/// camera.set_position([0.0, 0.5, 1.0]);
/// camera.set_aspect(4.0 / 3.0); // projection rebuilt once, here
/// let _view = camera.view_matrix();
/// ```
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    position: Vector3,
    target: Vector3,
    up: Vector3,
    depth_range: DepthRange,
    projection: Matrix4,
    view: Matrix4,
}

impl PerspectiveCamera {
    pub fn new(params: PerspectiveParams) -> Self {
        let mut camera = Self {
            fov: params.fov,
            aspect: params.aspect,
            near: params.near,
            far: params.far,
            position: params.position,
            target: params.target,
            up: Vector3::Y,
            depth_range: DepthRange::default(),
            projection: Matrix4::IDENTITY,
            view: Matrix4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera.update_view_matrix();
        camera
    }

    /// Switch the clip-space depth convention and rebuild the projection.
    pub fn with_depth_range(mut self, depth_range: DepthRange) -> Self {
        self.depth_range = depth_range;
        self.update_projection_matrix();
        self
    }

    pub fn projection_matrix(&self) -> &Matrix4 {
        &self.projection
    }

    pub fn view_matrix(&self) -> &Matrix4 {
        &self.view
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn target(&self) -> Vector3 {
        self.target
    }

    pub fn up(&self) -> Vector3 {
        self.up
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn depth_range(&self) -> DepthRange {
        self.depth_range
    }

    pub fn set_position(&mut self, position: impl Into<Vector3>) {
        self.position = position.into();
        self.update_view_matrix();
    }

    pub fn set_target(&mut self, target: impl Into<Vector3>) {
        self.target = target.into();
        self.update_view_matrix();
    }

    /// Set the vertical field of view in degrees.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.update_projection_matrix();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    pub fn set_near(&mut self, near: f32) {
        self.near = near;
        self.update_projection_matrix();
    }

    pub fn set_far(&mut self, far: f32) {
        self.far = far;
        self.update_projection_matrix();
    }

    /// Rebuild the projection matrix from fov/aspect/near/far.
    #[rustfmt::skip]
    pub fn update_projection_matrix(&mut self) {
        let (near, far) = (self.near, self.far);
        let top = near * (self.fov.to_radians() * 0.5).tan();
        let right = top * self.aspect;
        let depth = far - near;

        let (m22, m23) = match self.depth_range {
            DepthRange::NegativeOneToOne => (-(far + near) / depth, -(2.0 * far * near) / depth),
            DepthRange::ZeroToOne => (-far / depth, -(far * near) / depth),
        };

        self.projection = Matrix4::from_rows([
            [near / right,        0.0,  0.0, 0.0],
            [         0.0, near / top,  0.0, 0.0],
            [         0.0,        0.0,  m22, m23],
            [         0.0,        0.0, -1.0, 0.0],
        ]);
    }

    /// Rebuild the view matrix from position/target/up.
    ///
    /// When `position == target` there is no viewing direction, and the previous
    /// view matrix is kept as-is.
    #[rustfmt::skip]
    pub fn update_view_matrix(&mut self) {
        let (position, target, up) = (self.position, self.target, self.up);
        if position == target {
            log::debug!("camera position equals target; keeping previous view matrix");
            return;
        }

        let z = Vector3::normalized(position - target);
        let x = normalize_or_zero(Vector3::cross(up, z));
        let y = normalize_or_zero(Vector3::cross(z, x));

        let tx = -Vector3::dot(x, position);
        let ty = -Vector3::dot(y, position);
        let tz = -Vector3::dot(z, position);

        self.view = Matrix4::from_rows([
            [x.x, x.y, x.z,  tx],
            [y.x, y.y, y.z,  ty],
            [z.x, z.y, z.z,  tz],
            [0.0, 0.0, 0.0, 1.0],
        ]);
    }
}

/// Basis axes collapse to zero when the view direction is parallel to `up`.
fn normalize_or_zero(v: Vector3) -> Vector3 {
    if v.length() == 0.0 {
        Vector3::ZERO
    } else {
        Vector3::normalized(v)
    }
}
