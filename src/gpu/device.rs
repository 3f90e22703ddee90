//! The graphics API seen by [`GpuProgram`](super::GpuProgram).
//!
//! [`RenderDevice`] is a deliberately small, name-keyed, immediate-mode surface:
//! compile and link programs, fill buffers, point attributes at buffers, set
//! uniforms, clear and draw. Resources are referred to by copyable handles;
//! the device owns the actual objects.
//!
//! Two implementations ship with the crate:
//!
//! - [`WgpuDevice`](super::WgpuDevice) renders to a window surface through wgpu.
//! - [`HeadlessDevice`](super::HeadlessDevice) keeps everything in memory and
//!   records draw calls, for tests and offscreen runs.

use std::fmt;

use crate::camera::DepthRange;
use crate::math::Matrix4;

/// A pipeline stage a shader is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// A compiled, not yet linked, shader stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub(crate) u32);

/// A linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub(crate) u32);

/// A vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u32);

/// A resolved uniform inside a specific program.
///
/// Locations carry the uniform's declared [`UniformKind`], so callers can check
/// a value against the shader before sending it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub(crate) program: ProgramHandle,
    pub(crate) index: u32,
    pub(crate) kind: UniformKind,
}

impl UniformLocation {
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn kind(&self) -> UniformKind {
        self.kind
    }
}

/// How often a buffer's contents are expected to change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times.
    #[default]
    StaticDraw,
    /// Rewritten occasionally.
    DynamicDraw,
    /// Rewritten about once per draw.
    StreamDraw,
}

/// Primitive assembly for [`RenderDevice::draw_arrays`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}

/// The closed set of uniform types a program can bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// `f32`
    Float,
    /// `vec2<f32>`
    Vec2,
    /// `mat4x4<f32>`
    Mat4,
}

impl UniformKind {
    /// Size of the value in bytes, as laid out in a uniform buffer.
    pub fn byte_size(self) -> usize {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Mat4 => 64,
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformKind::Float => f.write_str("f32"),
            UniformKind::Vec2 => f.write_str("vec2<f32>"),
            UniformKind::Mat4 => f.write_str("mat4x4<f32>"),
        }
    }
}

/// A uniform value ready for upload.
///
/// Matrices are stored column-major; build them with `From<Matrix4>`, which is
/// where the row/column transpose happens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// The zero value of `kind`.
    pub fn zeroed(kind: UniformKind) -> Self {
        match kind {
            UniformKind::Float => UniformValue::Float(0.0),
            UniformKind::Vec2 => UniformValue::Vec2([0.0; 2]),
            UniformKind::Mat4 => UniformValue::Mat4([0.0; 16]),
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    /// The value's bytes in uniform-buffer layout.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Vec2(v) => bytemuck::cast_slice(v),
            UniformValue::Mat4(v) => bytemuck::cast_slice(v),
        }
    }

    /// Decode a value of `kind` from uniform-buffer bytes.
    pub fn from_bytes(kind: UniformKind, bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..kind.byte_size())?;
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect();
        Some(match kind {
            UniformKind::Float => UniformValue::Float(floats[0]),
            UniformKind::Vec2 => UniformValue::Vec2([floats[0], floats[1]]),
            UniformKind::Mat4 => UniformValue::Mat4(floats.try_into().ok()?),
        })
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Matrix4> for UniformValue {
    fn from(m: Matrix4) -> Self {
        UniformValue::Mat4(m.to_gpu_array())
    }
}

impl From<&Matrix4> for UniformValue {
    fn from(m: &Matrix4) -> Self {
        UniformValue::Mat4(m.to_gpu_array())
    }
}

/// Linear RGBA color in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

/// Pixel rectangle the next draws render into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The graphics API a [`GpuProgram`](super::GpuProgram) drives.
///
/// Failures that only degrade a frame (unknown handles, out-of-range uploads)
/// are absorbed by the device and logged. Compile and link failures are
/// returned as the backend's diagnostic text.
pub trait RenderDevice {
    /// Compile one stage. On failure returns the compiler log.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String>;

    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Link a vertex and a fragment stage. On failure returns the linker log.
    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String>;

    /// Make `program` the target of subsequent draws.
    fn use_program(&mut self, program: ProgramHandle);

    fn delete_program(&mut self, program: ProgramHandle);

    /// Allocate an empty buffer name; storage comes with [`buffer_data`](Self::buffer_data).
    fn create_buffer(&mut self) -> BufferHandle;

    /// (Re)allocate `buffer` with `data`.
    fn buffer_data(&mut self, buffer: BufferHandle, data: &[f32], usage: BufferUsage);

    /// Overwrite part of `buffer`, starting at float `offset`.
    /// Returns `false` if the range does not fit the allocation.
    fn buffer_sub_data(&mut self, buffer: BufferHandle, offset: usize, data: &[f32]) -> bool;

    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Location of a vertex input, or `None` if the program has no such input.
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Source attribute `location` from `buffer`, `components` floats per vertex.
    fn vertex_attribute_pointer(&mut self, location: u32, buffer: BufferHandle, components: u32);

    /// Resolve a uniform, or `None` if the program does not declare it with a
    /// supported type.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue);

    /// Current device-side value of a uniform.
    fn uniform_value(&self, location: UniformLocation) -> Option<UniformValue>;

    /// Draw `count` vertices starting at `first` with the current program.
    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32);

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_clear_color(&mut self, color: Color);

    /// Clear the color and depth buffers.
    fn clear(&mut self);

    /// Finish the frame. Devices that present implicitly need not override this.
    fn present(&mut self) {}

    /// Depth convention projection matrices must target for this device.
    fn depth_range(&self) -> DepthRange {
        DepthRange::NegativeOneToOne
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_bytes_round_trip_through_layout() {
        let mut m = Matrix4::identity();
        m.translate([1.0, 2.0, 3.0]);
        for value in [
            UniformValue::Float(0.25),
            UniformValue::Vec2([0.1, -0.1]),
            UniformValue::from(m),
        ] {
            let decoded = UniformValue::from_bytes(value.kind(), value.as_bytes());
            assert_eq!(decoded, Some(value));
        }
    }

    #[test]
    fn short_buffers_do_not_decode() {
        assert_eq!(UniformValue::from_bytes(UniformKind::Mat4, &[0u8; 16]), None);
    }

    #[test]
    fn matrix_values_are_column_major() {
        let mut m = Matrix4::identity();
        m.translate([4.0, 5.0, 6.0]);
        let UniformValue::Mat4(data) = UniformValue::from(&m) else {
            panic!("expected a matrix value");
        };
        assert_eq!(&data[12..15], &[4.0, 5.0, 6.0]);
    }
}
