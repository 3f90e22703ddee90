//! The per-frame driver for the rippling plane.
//!
//! [`PlaneRenderer`] is a small state machine:
//!
//! ```text
//! Uninitialized --initialize--> Ready --start--> Running --stop/dispose--> Stopped
//! ```
//!
//! The host calls [`frame`](PlaneRenderer::frame) once per display refresh and
//! keeps scheduling frames until it returns [`FrameStatus::Stopped`]. Each
//! frame clears, advances time, spins the model, orbits the ripple center and
//! draws the plane.
//!
//! # Example
//!
//! ```
//! use ripple::{
//!     FrameStatus, HeadlessDevice, PlaneGeometry, PlaneRenderer, SceneConfig, SurfaceSize,
//! };
//!
//! let mut device = HeadlessDevice::new();
//! let mut renderer = PlaneRenderer::new(SceneConfig {
//!     plane: PlaneGeometry::new().segments(8, 8),
//!     ..Default::default()
//! });
//! renderer.initialize(&mut device, SurfaceSize::new(640, 480))?;
//! renderer.start()?;
//!
//! let stop = renderer.stop_handle();
//! assert_eq!(renderer.frame(&mut device), FrameStatus::Rendered);
//! stop.stop();
//! assert_eq!(renderer.frame(&mut device), FrameStatus::Stopped);
//! renderer.dispose(&mut device);
//! # Ok::<(), ripple::RenderError>(())
//! ```

use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;

use crate::camera::{PerspectiveCamera, PerspectiveParams};
use crate::geometry::{self, PlaneGeometry};
use crate::gpu::{
    BufferUsage, Color, GpuError, PrimitiveMode, RenderDevice, Triangles, UniformKind, UniformValue,
    Viewport,
};
use crate::math::{Matrix4, Quaternion, Vector3};
use crate::surface::{ResizeEvents, ResizeSubscription, SurfaceSize};

pub const VERTEX_SHADER: &str = include_str!("shaders/plane.vert.wgsl");
pub const FRAGMENT_SHADER: &str = include_str!("shaders/plane.frag.wgsl");

/// Uniform and attribute names shared with the plane shaders.
pub mod names {
    pub const TIME: &str = "time";
    pub const CENTER: &str = "center";
    pub const MODEL_MATRIX: &str = "model_matrix";
    pub const VIEW_MATRIX: &str = "view_matrix";
    pub const PROJECTION_MATRIX: &str = "projection_matrix";
    pub const POSITION: &str = "position";
    pub const NORMAL: &str = "normal";
}

/// Scene constants for [`PlaneRenderer`].
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub clear_color: Color,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: Vector3,
    pub camera_target: Vector3,
    pub plane: PlaneGeometry,
    /// Added to the `time` uniform every frame.
    pub time_step: f32,
    /// Radians the model turns about Y every frame.
    pub rotation_step: f32,
    /// Radians the ripple center advances every frame.
    pub orbit_step: f32,
    /// Distance of the ripple center from the origin.
    pub orbit_radius: f32,
    /// Value of the `center` uniform before the first frame.
    pub initial_center: [f32; 2],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::rgba(0.1, 0.1, 0.1, 1.0),
            fov: 30.0,
            near: 0.1,
            far: 10.0,
            camera_position: Vector3::new(0.0, 0.5, 1.0),
            camera_target: Vector3::ZERO,
            plane: PlaneGeometry::default(),
            time_step: 0.01,
            rotation_step: 0.003,
            orbit_step: 0.003,
            orbit_radius: 0.15,
            initial_center: [0.1, 0.1],
        }
    }
}

/// Lifecycle of a [`PlaneRenderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderState {
    Uninitialized,
    Ready,
    Running,
    Stopped,
}

/// Outcome of one [`PlaneRenderer::frame`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Rendered,
    /// The renderer is stopped; do not schedule another frame.
    Stopped,
    /// Not running yet; nothing was drawn.
    Skipped,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("cannot {action} a renderer in the {state:?} state")]
    InvalidTransition {
        action: &'static str,
        state: RenderState,
    },
}

/// Stops a running [`PlaneRenderer`] from outside the frame loop.
///
/// Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug)]
struct Scene {
    triangles: Triangles,
    camera: PerspectiveCamera,
    model: Matrix4,
    angle: f32,
    size: SurfaceSize,
}

/// Drives the plane program frame by frame. See the [module docs](self).
#[derive(Debug)]
pub struct PlaneRenderer {
    config: SceneConfig,
    state: RenderState,
    scene: Option<Scene>,
    stop: StopHandle,
    resize: Option<ResizeSubscription>,
}

impl PlaneRenderer {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            state: RenderState::Uninitialized,
            scene: None,
            stop: StopHandle::default(),
            resize: None,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.scene.as_ref().map(|s| &s.camera)
    }

    pub fn model_matrix(&self) -> Option<&Matrix4> {
        self.scene.as_ref().map(|s| &s.model)
    }

    pub fn triangles(&self) -> Option<&Triangles> {
        self.scene.as_ref().map(|s| &s.triangles)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Receive surface sizes from `events`, replacing any earlier subscription.
    pub fn subscribe(&mut self, events: &ResizeEvents) {
        self.resize = Some(events.subscribe());
    }

    /// Build the program, geometry, uniforms and camera.
    pub fn initialize<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        size: SurfaceSize,
    ) -> Result<(), RenderError> {
        self.expect_state(RenderState::Uninitialized, "initialize")?;
        let config = &self.config;

        device.set_clear_color(config.clear_color);
        device.set_viewport(Viewport::new(0, 0, size.width, size.height));

        let mut triangles = Triangles::new(device, VERTEX_SHADER, FRAGMENT_SHADER)?;

        let plane = config.plane.build();
        triangles.set_attribute(
            device,
            names::POSITION,
            &plane.positions,
            geometry::COMPONENTS,
            BufferUsage::StaticDraw,
        );
        triangles.set_attribute(
            device,
            names::NORMAL,
            &plane.normals,
            geometry::COMPONENTS,
            BufferUsage::StaticDraw,
        );

        let camera = PerspectiveCamera::new(PerspectiveParams {
            fov: config.fov,
            aspect: size.aspect(),
            near: config.near,
            far: config.far,
            position: config.camera_position,
            target: config.camera_target,
        })
        .with_depth_range(device.depth_range());
        let model = Matrix4::identity();

        let uniforms = [
            (names::TIME, UniformValue::Float(0.0)),
            (names::CENTER, UniformValue::Vec2(config.initial_center)),
            (names::MODEL_MATRIX, UniformValue::from(&model)),
            (names::VIEW_MATRIX, UniformValue::from(camera.view_matrix())),
            (names::PROJECTION_MATRIX, UniformValue::from(camera.projection_matrix())),
        ];
        for (name, value) in uniforms {
            if let Err(e) = triangles.set_uniform(device, name, value) {
                triangles.dispose(device);
                return Err(e.into());
            }
        }

        triangles.bind(device);

        log::info!(
            "plane ready: {} vertices, {}x{}",
            plane.vertex_count(),
            size.width,
            size.height
        );
        self.scene = Some(Scene {
            triangles,
            camera,
            model,
            angle: 0.0,
            size,
        });
        self.state = RenderState::Ready;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), RenderError> {
        self.expect_state(RenderState::Ready, "start")?;
        self.state = RenderState::Running;
        Ok(())
    }

    /// Apply a new surface size now: viewport and camera aspect.
    pub fn resize<D: RenderDevice + ?Sized>(&mut self, device: &mut D, size: SurfaceSize) {
        if let Some(scene) = self.scene.as_mut() {
            apply_resize(device, scene, size);
        }
    }

    /// Render one frame.
    pub fn frame<D: RenderDevice + ?Sized>(&mut self, device: &mut D) -> FrameStatus {
        if self.stop.is_stopped() && self.state != RenderState::Stopped {
            log::info!("renderer stopped");
            self.state = RenderState::Stopped;
        }
        match self.state {
            RenderState::Running => {}
            RenderState::Stopped => return FrameStatus::Stopped,
            RenderState::Uninitialized | RenderState::Ready => return FrameStatus::Skipped,
        }
        let Some(scene) = self.scene.as_mut() else {
            return FrameStatus::Skipped;
        };

        if let Some(size) = self.resize.as_ref().and_then(ResizeSubscription::take) {
            apply_resize(device, scene, size);
        }

        let config = &self.config;
        let triangles = &mut scene.triangles;

        device.clear();

        triangles.add_uniform_value(device, names::TIME, config.time_step);

        scene.model.rotate(Vector3::Y, config.rotation_step);
        triangles.update_uniform(device, names::MODEL_MATRIX, UniformValue::from(&scene.model));
        triangles.update_uniform(
            device,
            names::VIEW_MATRIX,
            UniformValue::from(scene.camera.view_matrix()),
        );
        triangles.update_uniform(
            device,
            names::PROJECTION_MATRIX,
            UniformValue::from(scene.camera.projection_matrix()),
        );

        scene.angle += config.orbit_step;
        let center = Quaternion::from_axis_angle(Vector3::Y, scene.angle)
            .rotate_vector([config.orbit_radius, 0.0, 0.0]);
        triangles.update_uniform(device, names::CENTER, UniformValue::Vec2([center.x, center.z]));

        triangles.draw(device, PrimitiveMode::Triangles, None);
        device.present();

        log::trace!("frame at angle {:.3}", scene.angle);
        FrameStatus::Rendered
    }

    /// Release GPU resources and stop. Safe to call in any state.
    pub fn dispose<D: RenderDevice + ?Sized>(&mut self, device: &mut D) {
        if let Some(scene) = self.scene.take() {
            scene.triangles.dispose(device);
        }
        self.resize = None;
        self.stop.stop();
        self.state = RenderState::Stopped;
    }

    fn expect_state(&self, expected: RenderState, action: &'static str) -> Result<(), RenderError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RenderError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }
}

fn apply_resize<D: RenderDevice + ?Sized>(device: &mut D, scene: &mut Scene, size: SurfaceSize) {
    if size.is_empty() || size == scene.size {
        return;
    }
    log::debug!("resize to {}x{}", size.width, size.height);
    device.set_viewport(Viewport::new(0, 0, size.width, size.height));
    scene.camera.set_aspect(size.aspect());
    scene.size = size;
}

/// Uniform kinds the plane shaders must declare, for callers that swap in
/// their own shader sources.
pub const UNIFORMS: [(&str, UniformKind); 5] = [
    (names::TIME, UniformKind::Float),
    (names::CENTER, UniformKind::Vec2),
    (names::MODEL_MATRIX, UniformKind::Mat4),
    (names::VIEW_MATRIX, UniformKind::Mat4),
    (names::PROJECTION_MATRIX, UniformKind::Mat4),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;
    use approx::assert_abs_diff_eq;

    fn small_config() -> SceneConfig {
        SceneConfig {
            plane: PlaneGeometry::new().segments(4, 4),
            ..Default::default()
        }
    }

    fn running(device: &mut HeadlessDevice) -> PlaneRenderer {
        let mut renderer = PlaneRenderer::new(small_config());
        renderer.initialize(device, SurfaceSize::new(800, 400)).unwrap();
        renderer.start().unwrap();
        renderer
    }

    fn uniform(renderer: &PlaneRenderer, device: &HeadlessDevice, name: &str) -> UniformValue {
        renderer.triangles().unwrap().uniform_value(device, name).unwrap()
    }

    #[test]
    fn initialize_sets_up_device_and_uniforms() {
        let mut device = HeadlessDevice::new();
        let mut renderer = PlaneRenderer::new(small_config());
        renderer.initialize(&mut device, SurfaceSize::new(800, 400)).unwrap();

        assert_eq!(renderer.state(), RenderState::Ready);
        assert_eq!(device.clear_color(), Color::rgba(0.1, 0.1, 0.1, 1.0));
        assert_eq!(device.viewport(), Viewport::new(0, 0, 800, 400));
        assert_eq!(device.live_buffers(), 2);
        assert_eq!(renderer.triangles().unwrap().vertex_count(), Some(96));
        assert_eq!(uniform(&renderer, &device, names::TIME), UniformValue::Float(0.0));
        assert_eq!(uniform(&renderer, &device, names::CENTER), UniformValue::Vec2([0.1, 0.1]));
        assert_eq!(renderer.camera().unwrap().aspect(), 2.0);
        for (name, kind) in UNIFORMS {
            assert_eq!(uniform(&renderer, &device, name).kind(), kind, "{name}");
        }
    }

    #[test]
    fn frames_only_render_while_running() {
        let mut device = HeadlessDevice::new();
        let mut renderer = PlaneRenderer::new(small_config());
        assert_eq!(renderer.frame(&mut device), FrameStatus::Skipped);

        renderer.initialize(&mut device, SurfaceSize::new(800, 400)).unwrap();
        assert_eq!(renderer.frame(&mut device), FrameStatus::Skipped);
        assert!(device.draw_calls().is_empty());

        renderer.start().unwrap();
        assert_eq!(renderer.frame(&mut device), FrameStatus::Rendered);
        assert_eq!(device.clear_count(), 1);
        assert_eq!(device.present_count(), 1);
        assert_eq!(device.draw_calls().len(), 1);
        assert_eq!(device.draw_calls()[0].count, 96);
        assert_eq!(device.draw_calls()[0].mode, PrimitiveMode::Triangles);
    }

    #[test]
    fn frame_advances_time_rotation_and_orbit() {
        let mut device = HeadlessDevice::new();
        let mut renderer = running(&mut device);
        for _ in 0..10 {
            renderer.frame(&mut device);
        }

        let UniformValue::Float(time) = uniform(&renderer, &device, names::TIME) else {
            panic!("time is not a float");
        };
        assert_abs_diff_eq!(time, 0.1, epsilon = 1e-5);

        let mut expected = Matrix4::identity();
        for _ in 0..10 {
            expected.rotate(Vector3::Y, 0.003);
        }
        assert_eq!(
            uniform(&renderer, &device, names::MODEL_MATRIX),
            UniformValue::from(&expected)
        );

        // q⁻¹·v·q turns the center by -angle about Y.
        let angle = 0.03f32;
        let UniformValue::Vec2([x, z]) = uniform(&renderer, &device, names::CENTER) else {
            panic!("center is not a vec2");
        };
        assert_abs_diff_eq!(x, 0.15 * angle.cos(), epsilon = 1e-5);
        assert_abs_diff_eq!(z, 0.15 * angle.sin(), epsilon = 1e-5);
    }

    #[test]
    fn resize_updates_viewport_and_projection_once() {
        let mut device = HeadlessDevice::new();
        let events = ResizeEvents::new();
        let mut renderer = running(&mut device);
        renderer.subscribe(&events);
        let before = *renderer.camera().unwrap().projection_matrix();

        events.emit(SurfaceSize::new(300, 300));
        renderer.frame(&mut device);

        assert_eq!(device.viewport(), Viewport::new(0, 0, 300, 300));
        let camera = renderer.camera().unwrap();
        assert_eq!(camera.aspect(), 1.0);
        assert_ne!(*camera.projection_matrix(), before);
        assert_eq!(
            uniform(&renderer, &device, names::PROJECTION_MATRIX),
            UniformValue::from(camera.projection_matrix())
        );
    }

    #[test]
    fn stop_handle_ends_the_loop() {
        let mut device = HeadlessDevice::new();
        let mut renderer = running(&mut device);
        let stop = renderer.stop_handle();

        assert_eq!(renderer.frame(&mut device), FrameStatus::Rendered);
        stop.stop();
        assert_eq!(renderer.frame(&mut device), FrameStatus::Stopped);
        assert_eq!(renderer.frame(&mut device), FrameStatus::Stopped);
        assert_eq!(renderer.state(), RenderState::Stopped);
        assert_eq!(device.draw_calls().len(), 1);
    }

    #[test]
    fn dispose_releases_everything() {
        let mut device = HeadlessDevice::new();
        let events = ResizeEvents::new();
        let mut renderer = running(&mut device);
        renderer.subscribe(&events);

        renderer.dispose(&mut device);
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_programs(), 0);
        assert_eq!(events.subscriber_count(), 0);
        assert_eq!(renderer.frame(&mut device), FrameStatus::Stopped);

        renderer.dispose(&mut device);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let mut device = HeadlessDevice::new();
        let mut renderer = PlaneRenderer::new(small_config());
        assert!(matches!(
            renderer.start(),
            Err(RenderError::InvalidTransition {
                action: "start",
                state: RenderState::Uninitialized,
            })
        ));

        renderer.initialize(&mut device, SurfaceSize::new(10, 10)).unwrap();
        assert!(renderer.initialize(&mut device, SurfaceSize::new(10, 10)).is_err());

        renderer.dispose(&mut device);
        assert!(renderer.start().is_err());
    }

    #[test]
    fn camera_follows_the_device_depth_range() {
        let mut device = HeadlessDevice::new();
        let renderer = running(&mut device);
        assert_eq!(
            renderer.camera().unwrap().depth_range(),
            crate::camera::DepthRange::NegativeOneToOne
        );
    }
}
