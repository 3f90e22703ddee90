//! # Ripple
//!
//! **An animated tessellated plane, from matrices to pixels.**
//!
//! Ripple draws a finely tessellated plane whose surface ripples out from a
//! slowly orbiting center while the whole plane turns. It is built from three
//! small layers:
//!
//! - **Math**: [`Vector3`], [`Quaternion`] and [`Matrix4`], plus a
//!   [`PerspectiveCamera`] that caches its view and projection matrices.
//! - **GPU programs**: [`GpuProgram`] compiles and links WGSL, owns attribute
//!   buffers and a name-keyed uniform table, and talks to the graphics API only
//!   through [`RenderDevice`]. [`WgpuDevice`] renders to a window;
//!   [`HeadlessDevice`] records everything in memory.
//! - **Render driver**: [`PlaneRenderer`] advances time, rotation and the
//!   ripple center once per frame.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> anyhow::Result<()> {
//!     ripple::run(ripple::AppConfig::new().title("Ripple"))
//! }
//! ```
//!
//! ## Without a window
//!
//! ```
//! use ripple::{
//!     FrameStatus, HeadlessDevice, PlaneGeometry, PlaneRenderer, SceneConfig, SurfaceSize,
//! };
//!
//! let mut device = HeadlessDevice::new();
//! let mut renderer = PlaneRenderer::new(SceneConfig {
//!     plane: PlaneGeometry::new().segments(16, 16),
//!     ..Default::default()
//! });
//! renderer.initialize(&mut device, SurfaceSize::new(800, 600))?;
//! renderer.start()?;
//! for _ in 0..3 {
//!     assert_eq!(renderer.frame(&mut device), FrameStatus::Rendered);
//! }
//! assert_eq!(device.draw_calls().len(), 3);
//! # Ok::<(), ripple::RenderError>(())
//! ```

mod app;
mod camera;
mod geometry;
mod gpu;
mod logging;
pub mod math;
pub mod renderer;
mod surface;

pub use app::{AppConfig, run};
pub use camera::{DepthRange, PerspectiveCamera, PerspectiveParams};
pub use geometry::{PlaneGeometry, PlaneMesh};
pub use gpu::{
    BufferHandle, BufferUsage, Color, DrawCall, GpuError, GpuProgram, GpuResult, HeadlessDevice,
    PrimitiveMode, ProgramHandle, RenderDevice, ShaderHandle, ShaderStage, Triangles, UniformKind,
    UniformLocation, UniformValue, Viewport, WgpuDevice,
};
pub use logging::{LoggingConfig, init_logging};
pub use math::{Matrix4, Quaternion, Vector3};
pub use renderer::{FrameStatus, PlaneRenderer, RenderError, RenderState, SceneConfig, StopHandle};
pub use surface::{ResizeEvents, ResizeSubscription, SurfaceSize};
