//! GPU resources behind a small immediate-mode device API.
//!
//! [`GpuProgram`] owns one linked program plus its attribute buffers and
//! uniform table, and talks to the graphics API only through the
//! [`RenderDevice`] trait. [`Triangles`] adds drawing on top.

mod device;
mod error;
mod headless;
mod program;
pub(crate) mod shader;
mod triangles;
mod wgpu_device;

pub use device::{
    BufferHandle, BufferUsage, Color, PrimitiveMode, ProgramHandle, RenderDevice, ShaderHandle,
    ShaderStage, UniformKind, UniformLocation, UniformValue, Viewport,
};
pub use error::{GpuError, GpuResult};
pub use headless::{DrawCall, HeadlessDevice};
pub use program::GpuProgram;
pub use triangles::Triangles;
pub use wgpu_device::WgpuDevice;
